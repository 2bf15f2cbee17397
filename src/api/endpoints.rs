//! Typed wrappers for each Workers API route.

use crate::api::{client::ApiClient, error::ApiError};
use crate::models::{
    AiConclusion, Bookmark, ChatQuery, ChatReply, CitySummary, ConclusionRequest, DashboardStats,
    EmployeeInsight, InsightSummary, LoginRequest, LoginResponse, NewBookmark, PageContext, User,
};
use reqwest::Method;
use serde_json::Value;

impl ApiClient {
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        self.send_json(Method::POST, self.url("/api/auth/login"), None, &body)
            .await
    }

    pub async fn logout(&self, token: &str) -> Result<(), ApiError> {
        let _: Value = self
            .send_json(
                Method::POST,
                self.url("/api/auth/logout"),
                Some(token),
                &serde_json::json!({}),
            )
            .await?;
        Ok(())
    }

    pub async fn verify_session(&self, token: &str) -> Result<User, ApiError> {
        self.get("/api/auth/verify", Some(token), &[]).await
    }

    pub async fn current_user(&self, token: &str) -> Result<User, ApiError> {
        self.get("/api/auth/me", Some(token), &[]).await
    }

    pub async fn insights_summary(&self, token: &str) -> Result<Vec<InsightSummary>, ApiError> {
        self.get("/api/insights/summary", Some(token), &[]).await
    }

    pub async fn dashboard_stats(&self, token: &str) -> Result<DashboardStats, ApiError> {
        self.get("/api/insights/dashboard", Some(token), &[]).await
    }

    pub async fn top_positive(&self, token: &str) -> Result<Vec<InsightSummary>, ApiError> {
        self.get("/api/insights/top-positive", Some(token), &[]).await
    }

    pub async fn top_negative(&self, token: &str) -> Result<Vec<InsightSummary>, ApiError> {
        self.get("/api/insights/top-negative", Some(token), &[]).await
    }

    pub async fn insights_by_word(
        &self,
        token: &str,
        word: &str,
    ) -> Result<Vec<InsightSummary>, ApiError> {
        let path = format!("/api/insights/{}", urlencoding::encode(word));
        self.get(&path, Some(token), &[]).await
    }

    pub async fn employee_insights(&self, token: &str) -> Result<Vec<EmployeeInsight>, ApiError> {
        self.get("/api/employee-insights", Some(token), &[]).await
    }

    pub async fn employee_insights_for_word(
        &self,
        token: &str,
        word: &str,
    ) -> Result<Vec<EmployeeInsight>, ApiError> {
        let path = format!("/api/employee-insights/{}", urlencoding::encode(word));
        self.get(&path, Some(token), &[]).await
    }

    pub async fn kota_summary(&self, token: &str) -> Result<Vec<CitySummary>, ApiError> {
        self.get("/api/kota-summary", Some(token), &[]).await
    }

    pub async fn bookmarks(&self, token: &str) -> Result<Vec<Bookmark>, ApiError> {
        self.get("/api/bookmarks", Some(token), &[]).await
    }

    pub async fn add_bookmark(
        &self,
        token: &str,
        bookmark: &NewBookmark,
    ) -> Result<Bookmark, ApiError> {
        self.send_json(Method::POST, self.url("/api/bookmarks"), Some(token), bookmark)
            .await
    }

    pub async fn remove_bookmark(&self, token: &str, id: i64) -> Result<(), ApiError> {
        let _: Value = self
            .delete(&format!("/api/bookmarks/{id}"), Some(token))
            .await?;
        Ok(())
    }

    /// `None` when the API has no context stored for this session yet, either
    /// as a 404 or as a `null` payload.
    pub async fn page_context(
        &self,
        token: &str,
        page: &str,
        session_id: &str,
    ) -> Result<Option<PageContext>, ApiError> {
        let path = format!("/api/page-context/{}", urlencoding::encode(page));
        let context: Option<Option<PageContext>> = self
            .get_optional(&path, Some(token), &[("session_id", session_id.to_string())])
            .await?;
        Ok(context.flatten())
    }

    pub async fn save_page_context(
        &self,
        token: &str,
        context: &PageContext,
    ) -> Result<PageContext, ApiError> {
        let url = self.url(&format!(
            "/api/page-context/{}",
            urlencoding::encode(&context.page)
        ));
        self.send_json(Method::PUT, url, Some(token), context).await
    }

    pub async fn ai_conclusion(
        &self,
        token: &str,
        page: &str,
        session_id: &str,
    ) -> Result<Option<AiConclusion>, ApiError> {
        let path = format!("/api/ai-conclusion/{}", urlencoding::encode(page));
        let conclusion: Option<Option<AiConclusion>> = self
            .get_optional(&path, Some(token), &[("session_id", session_id.to_string())])
            .await?;
        Ok(conclusion.flatten())
    }

    pub async fn generate_ai_conclusion(
        &self,
        token: &str,
        page: &str,
        request: &ConclusionRequest,
    ) -> Result<AiConclusion, ApiError> {
        let url = self.url(&format!("/api/ai-conclusion/{}", urlencoding::encode(page)));
        self.send_json(Method::POST, url, Some(token), request).await
    }

    pub async fn chat(&self, token: &str, query: &ChatQuery) -> Result<ChatReply, ApiError> {
        let url = self.ai_search_url().to_string();
        self.send_json(Method::POST, url, Some(token), query).await
    }
}
