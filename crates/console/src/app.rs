//! Command execution against the backend.

use std::fs::File;
use std::io::BufWriter;
use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use serde_json::{Value, json};

use bizdesk_auth::{ErrorDisposition, FileTokenStore, TokenStore};
use bizdesk_client::export::{ExportError, export_all};
use bizdesk_client::{
    ApiError, AuthProvider, ClientConfig, DataProvider, HttpClient, ListParams, RestDataProvider,
};
use bizdesk_core::DateRange;
use bizdesk_dashboard::{Granularity, load_analytics, load_derived, load_stats};
use bizdesk_reports::{load_aging, load_profit_and_loss};

use crate::cli::Command;

/// Providers the commands run against.
pub struct App {
    auth: AuthProvider,
    data: Arc<dyn DataProvider>,
    page_size: u32,
}

impl App {
    /// Wire the REST providers from `config`, storing the session in the
    /// configured file (or the per-user default).
    pub fn from_config(config: &ClientConfig) -> anyhow::Result<Self> {
        let path = match &config.session_path {
            Some(path) => path.clone(),
            None => FileTokenStore::default_path().context("locating the session file")?,
        };
        tracing::debug!(session = %path.display(), api = %config.api_url, "console starting");
        let store: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(path));
        let http = HttpClient::new(config, store)?;
        Ok(Self::new(
            AuthProvider::new(http.clone()),
            Arc::new(RestDataProvider::new(http)),
            config.page_size,
        ))
    }

    pub fn new(auth: AuthProvider, data: Arc<dyn DataProvider>, page_size: u32) -> Self {
        Self {
            auth,
            data,
            page_size,
        }
    }

    /// Run one command; the result is printed as JSON by the caller.
    pub async fn run(&self, command: Command, today: NaiveDate) -> anyhow::Result<Value> {
        let data = self.data.as_ref();
        let value = match command {
            Command::Login { username, password } => {
                let session = self.auth.login(&username, &password).await?;
                json!({ "user": session.identity, "expiresAt": session.expires_at })
            }
            Command::Logout => json!({ "redirectTo": self.auth.logout().await }),
            Command::WhoAmI => {
                let identity = self.auth.get_identity().await?;
                let permissions = self.auth.get_permissions().await?;
                json!({ "user": identity, "permissions": permissions })
            }
            Command::List { resource, page } => {
                let result = data
                    .get_list(&resource, &ListParams::new().page(page, self.page_size))
                    .await?;
                json!({ "data": result.data, "total": result.total, "page": page })
            }
            Command::Dashboard { days } => {
                let range = DateRange::last_days(days, today);
                let granularity = if days > 62 {
                    Granularity::Month
                } else {
                    Granularity::Day
                };
                let (stats, charts) = tokio::try_join!(
                    load_stats(data, range),
                    load_derived(data, range, granularity, today),
                )?;
                json!({ "range": range, "stats": stats, "charts": charts })
            }
            Command::Analytics { metric, days } => {
                let range = DateRange::last_days(days, today);
                let series = load_analytics(data, metric, range, Granularity::Day, today).await?;
                json!({ "series": series, "total": series.total() })
            }
            Command::Aging { kind } => serde_json::to_value(load_aging(data, kind, today).await?)?,
            Command::ProfitLoss { days } => {
                let range = DateRange::last_days(days, today);
                serde_json::to_value(load_profit_and_loss(data, range).await?)?
            }
            Command::Export { resource, file } => {
                let out = File::create(&file)
                    .with_context(|| format!("creating {}", file.display()))?;
                let rows = export_all(data, &resource, &ListParams::new(), None, BufWriter::new(out))
                    .await?;
                json!({ "resource": resource, "rows": rows, "file": file.display().to_string() })
            }
        };
        Ok(value)
    }
}

/// One-line message for a failed command.
pub fn describe_error(err: &anyhow::Error) -> String {
    let api = err.downcast_ref::<ApiError>().or_else(|| match err.downcast_ref::<ExportError>() {
        Some(ExportError::Api(api)) => Some(api),
        _ => None,
    });
    match api.map(|e| (e, e.disposition())) {
        Some((_, ErrorDisposition::Logout { .. })) => "session expired, run login".to_string(),
        Some((_, ErrorDisposition::PermissionDenied)) => "permission denied".to_string(),
        Some((e, ErrorDisposition::Surface)) => e.user_message(),
        None => format!("{err:#}"),
    }
}
