use serde::Serialize;

use crate::collaborator::ScrapeResult;

#[derive(Serialize)]
pub struct ScrapeResponse {
    pub status: &'static str,
    pub data: ScrapeResult,
}

impl ScrapeResponse {
    pub fn success(data: ScrapeResult) -> Self {
        Self {
            status: "success",
            data,
        }
    }
}

#[derive(Serialize)]
pub struct ImageResponse {
    pub image_url: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
