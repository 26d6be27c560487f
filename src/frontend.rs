use crate::config::Config;

/// Account endpoints whose links are served by the frontend's `/account` page.
pub const ACCOUNT_ENDPOINTS: [&str; 8] = [
    "orders",
    "edit-account",
    "downloads",
    "edit-address",
    "payment-methods",
    "customer-logout",
    "lost-password",
    "view-order",
];

/// Rewrites store and account links onto the external frontend domain.
#[derive(Debug, Clone)]
pub struct FrontendLinks {
    domain: String,
}

impl FrontendLinks {
    pub fn new(domain: &str) -> Self {
        Self {
            domain: domain.trim().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.frontend_domain)
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn account_url(&self) -> String {
        format!("{}/account", self.domain)
    }

    pub fn view_order_url(&self) -> String {
        self.account_url()
    }

    /// Account endpoints map to the frontend account page; anything else keeps
    /// `fallback`.
    pub fn endpoint_url(&self, endpoint: &str, fallback: &str) -> String {
        if ACCOUNT_ENDPOINTS.contains(&endpoint) {
            self.account_url()
        } else {
            fallback.to_string()
        }
    }

    pub fn password_reset_url(&self, key: &str, login: &str) -> String {
        format!(
            "{}/auth/reset-password?action=rp&key={}&login={}",
            self.domain,
            key,
            urlencoding::encode(login)
        )
    }

    pub fn password_reset_message(&self, key: &str, login: &str) -> String {
        format!(
            "Hi {login},\n\n\
             To reset your password, click the link below:\n\n\
             {url}\n\n\
             If you didn't request this, you can ignore this message.\n",
            url = self.password_reset_url(key, login),
        )
    }

    pub fn redirect_target(&self, path_and_query: &str) -> String {
        if path_and_query.starts_with('/') {
            format!("{}{}", self.domain, path_and_query)
        } else {
            format!("{}/{}", self.domain, path_and_query)
        }
    }
}

/// Preview requests are left alone by the catch-all redirect.
pub fn is_preview(query: Option<&str>) -> bool {
    query
        .map(|q| q.split('&').any(|pair| pair == "preview=true"))
        .unwrap_or(false)
}
