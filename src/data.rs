use std::sync::Arc;

use crate::analysis::AnalysisOutcome;
use crate::api::{self, ApiError};
use crate::link::Platform;
use crate::product::Product;
use crate::text::{EnhanceStyle, TextAnalysis};
use crate::trends::{KeywordTrends, PlatformComparison};

pub trait EmbedService: Send + Sync {
    fn embed_html(&self, platform: Platform, link: &str) -> Result<String, ApiError>;
}

pub trait AnalysisService: Send + Sync {
    fn analyze(&self, platform: Platform, link: &str) -> Result<AnalysisOutcome, ApiError>;
}

pub trait TextService: Send + Sync {
    fn analyze_text(&self, text: &str) -> Result<TextAnalysis, ApiError>;
    fn enhance_text(&self, text: &str, style: EnhanceStyle) -> Result<String, ApiError>;
}

pub trait ProductService: Send + Sync {
    fn scrape(&self, product_url: &str) -> Result<Product, ApiError>;
}

pub trait TrendService: Send + Sync {
    fn keyword_trends(&self, keyword: &str) -> Result<KeywordTrends, ApiError>;
    fn platform_comparison(&self, keyword: &str) -> Result<PlatformComparison, ApiError>;
}

pub struct BackendEmbedService {
    client: Arc<api::Client>,
}

impl BackendEmbedService {
    pub fn new(client: Arc<api::Client>) -> Self {
        Self { client }
    }
}

impl EmbedService for BackendEmbedService {
    fn embed_html(&self, platform: Platform, link: &str) -> Result<String, ApiError> {
        self.client.embed_html(platform, link)
    }
}

pub struct BackendAnalysisService {
    client: Arc<api::Client>,
}

impl BackendAnalysisService {
    pub fn new(client: Arc<api::Client>) -> Self {
        Self { client }
    }
}

impl AnalysisService for BackendAnalysisService {
    fn analyze(&self, platform: Platform, link: &str) -> Result<AnalysisOutcome, ApiError> {
        self.client.analyze_link(platform, link)
    }
}

pub struct BackendTextService {
    client: Arc<api::Client>,
}

impl BackendTextService {
    pub fn new(client: Arc<api::Client>) -> Self {
        Self { client }
    }
}

impl TextService for BackendTextService {
    fn analyze_text(&self, text: &str) -> Result<TextAnalysis, ApiError> {
        self.client.analyze_text(text)
    }

    fn enhance_text(&self, text: &str, style: EnhanceStyle) -> Result<String, ApiError> {
        self.client.enhance_text(text, style)
    }
}

pub struct BackendProductService {
    client: Arc<api::Client>,
}

impl BackendProductService {
    pub fn new(client: Arc<api::Client>) -> Self {
        Self { client }
    }
}

impl ProductService for BackendProductService {
    fn scrape(&self, product_url: &str) -> Result<Product, ApiError> {
        self.client.scrape_product(product_url)
    }
}

pub struct BackendTrendService {
    client: Arc<api::Client>,
}

impl BackendTrendService {
    pub fn new(client: Arc<api::Client>) -> Self {
        Self { client }
    }
}

impl TrendService for BackendTrendService {
    fn keyword_trends(&self, keyword: &str) -> Result<KeywordTrends, ApiError> {
        self.client.keyword_trends(keyword)
    }

    fn platform_comparison(&self, keyword: &str) -> Result<PlatformComparison, ApiError> {
        self.client.platform_comparison(keyword)
    }
}

/// Every backend-facing service the UI needs, sharing one HTTP client.
#[derive(Clone)]
pub struct Services {
    pub embed: Arc<dyn EmbedService>,
    pub analysis: Arc<dyn AnalysisService>,
    pub text: Arc<dyn TextService>,
    pub product: Arc<dyn ProductService>,
    pub trends: Arc<dyn TrendService>,
}

impl Services {
    pub fn backend(client: Arc<api::Client>) -> Self {
        Self {
            embed: Arc::new(BackendEmbedService::new(client.clone())),
            analysis: Arc::new(BackendAnalysisService::new(client.clone())),
            text: Arc::new(BackendTextService::new(client.clone())),
            product: Arc::new(BackendProductService::new(client.clone())),
            trends: Arc::new(BackendTrendService::new(client)),
        }
    }
}
