use async_trait::async_trait;
use reqwest::{Request, Response};

/// Executes HTTP requests for [`super::fetch_bytes`]; swap implementations
/// to add authentication or fakes.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
