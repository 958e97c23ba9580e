use crate::domain::model::{ScoreKind, TransformResult};
use crate::domain::services::editing::{RecordOverride, RecordSelector};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &str;
    fn output_path(&self) -> &str;
    fn output_formats(&self) -> &[String];
    /// Archive name when outputs are bundled, `None` for loose files.
    fn archive_name(&self) -> Option<&str>;
    /// Institutional header repeated at the top of each page.
    fn header(&self) -> &str;
    fn overrides(&self) -> Vec<RecordOverride>;
    fn drops(&self) -> Vec<RecordSelector>;
    fn score_kind(&self) -> ScoreKind;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    /// Raw text of every transcript page, in page order.
    async fn extract(&self) -> Result<Vec<String>>;
    async fn transform(&self, pages: Vec<String>) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<String>;
}
