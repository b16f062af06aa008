use crate::domain::model::{CaseIdPolicy, ModelSettings, Stage, UploadTarget};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Human-readable location of `path` inside this storage.
    fn location(&self, path: &str) -> String;
}

pub trait ConfigProvider: Send + Sync {
    fn transactions_path(&self) -> &str;
    fn comments_path(&self) -> &str;
    fn output_path(&self) -> &str;
    fn upload_target(&self) -> UploadTarget;
    fn model_settings(&self) -> ModelSettings;
    /// None means every comment row is processed
    fn sample_size(&self) -> Option<usize>;
    fn concurrent_requests(&self) -> usize;
    fn case_id_policy(&self) -> CaseIdPolicy;
    fn stage(&self) -> Stage;
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}
