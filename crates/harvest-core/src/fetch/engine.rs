//! The fetch engine: one navigation-and-extract cycle per call.

use chrono::{SecondsFormat, Utc};
use futures::FutureExt;
use rand::Rng;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use super::detect::{inspect_page, PageMarkers, PageVerdict};
use super::extract::{extract_rows, TableSchema};
use super::failure::{FailureKind, FetchFailure};
use super::fingerprint::choose_fingerprint;
use crate::config::HarvestConfig;
use crate::driver::{DriverError, Fingerprint, PageDriver};
use crate::record::Row;
use crate::session::SessionHandle;

/// Extra time granted on top of a driver's own timeout before the engine gives up on it.
const DRIVER_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub navigation_timeout: Duration,
    pub table_timeout: Duration,
    pub table_selector: String,
    pub markers: PageMarkers,
    pub schema: TableSchema,
    /// Empty = built-in pool.
    pub user_agents: Vec<String>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self::from_config(&HarvestConfig::default())
    }
}

impl FetchSettings {
    pub fn from_config(cfg: &HarvestConfig) -> Self {
        Self {
            navigation_timeout: cfg.fetch.navigation_timeout(),
            table_timeout: cfg.fetch.table_timeout(),
            table_selector: cfg.fetch.table_selector.clone(),
            markers: PageMarkers::from_config(&cfg.fetch),
            schema: cfg
                .schema
                .clone()
                .map(TableSchema::from_rules)
                .unwrap_or_default(),
            user_agents: cfg.fetch.user_agents.clone().unwrap_or_default(),
        }
    }
}

/// Fetches pages for one worker identity.
///
/// The session and fingerprint are applied to the driver on the first fetch
/// only; later fetches reuse them.
pub struct FetchEngine {
    settings: FetchSettings,
    fingerprint: Fingerprint,
    prepared: bool,
}

impl FetchEngine {
    pub fn new<R: Rng + ?Sized>(settings: FetchSettings, rng: &mut R) -> Self {
        let fingerprint = choose_fingerprint(rng, &settings.user_agents);
        Self {
            settings,
            fingerprint,
            prepared: false,
        }
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    /// Loads `url` and extracts its rows. Never panics and never returns
    /// anything but rows or a typed failure.
    pub async fn fetch<D: PageDriver + ?Sized>(
        &mut self,
        driver: &mut D,
        session: &SessionHandle,
        url: &str,
    ) -> Result<Vec<Row>, FetchFailure> {
        if !self.prepared {
            self.prepare(driver, session).await;
        }

        match AssertUnwindSafe(self.load_and_extract(driver, url))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(panic) => Err(FetchFailure::new(
                FailureKind::Unknown,
                format!("driver panicked: {}", panic_message(&*panic)),
            )),
        }
    }

    async fn prepare<D: PageDriver + ?Sized>(&mut self, driver: &mut D, session: &SessionHandle) {
        self.prepared = true;
        let limit = self.settings.navigation_timeout;

        match AssertUnwindSafe(bounded(limit, driver.apply_credentials(session.tokens())))
            .catch_unwind()
            .await
        {
            Ok(Ok(())) => {
                tracing::debug!(tokens = session.len(), "session applied to driver")
            }
            Ok(Err(e)) => tracing::warn!(
                "could not apply session ({}); fetches will run unauthenticated",
                e
            ),
            Err(_) => tracing::warn!("driver panicked applying session; fetches will run unauthenticated"),
        }

        let fingerprint = self.fingerprint.clone();
        match AssertUnwindSafe(bounded(limit, driver.set_fingerprint(&fingerprint)))
            .catch_unwind()
            .await
        {
            Ok(Ok(())) => tracing::debug!(
                user_agent = %fingerprint.user_agent,
                width = fingerprint.viewport.width,
                height = fingerprint.viewport.height,
                "fingerprint applied"
            ),
            Ok(Err(e)) => tracing::warn!("could not set fingerprint: {}", e),
            Err(_) => tracing::warn!("driver panicked setting fingerprint"),
        }
    }

    async fn load_and_extract<D: PageDriver + ?Sized>(
        &self,
        driver: &mut D,
        url: &str,
    ) -> Result<Vec<Row>, FetchFailure> {
        let s = &self.settings;

        bounded(s.navigation_timeout, driver.navigate(url, s.navigation_timeout))
            .await
            .map_err(|e| FetchFailure::from_driver(&e))?;

        let resolved = bounded(s.navigation_timeout, driver.current_url())
            .await
            .map_err(|e| FetchFailure::from_driver(&e))?;
        let title = bounded(s.navigation_timeout, driver.title())
            .await
            .map_err(|e| FetchFailure::from_driver(&e))?;

        match inspect_page(&s.markers, &resolved, &title) {
            PageVerdict::Data => {}
            PageVerdict::Challenge(marker) => {
                return Err(FetchFailure::new(
                    FailureKind::ChallengeDetected,
                    format!("challenge marker {:?} (title {:?}, url {})", marker, title, resolved),
                ));
            }
            PageVerdict::Login(marker) => {
                return Err(FetchFailure::new(
                    FailureKind::SessionExpired,
                    format!("login marker {:?} (title {:?}, url {})", marker, title, resolved),
                ));
            }
        }

        let present = match bounded(
            s.table_timeout,
            driver.wait_for_element(&s.table_selector, s.table_timeout),
        )
        .await
        {
            Ok(found) => found,
            Err(DriverError::Timeout(_)) => false,
            Err(e) => return Err(FetchFailure::from_driver(&e)),
        };
        if !present {
            return Err(FetchFailure::new(
                FailureKind::TableNotFound,
                format!(
                    "no element matching {:?} within {:?} at {}",
                    s.table_selector, s.table_timeout, resolved
                ),
            ));
        }

        let table = bounded(s.table_timeout, driver.extract_table(&s.table_selector))
            .await
            .map_err(|e| match e {
                DriverError::Timeout(_) => FetchFailure::from_driver(&e),
                e => FetchFailure::new(FailureKind::Unknown, format!("extraction failed: {}", e)),
            })?;

        let scraped_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let extracted = extract_rows(&table, &s.schema, url, &scraped_at);
        tracing::debug!(
            url,
            rows = extracted.rows.len(),
            dropped = extracted.dropped,
            "extracted table rows"
        );
        Ok(extracted.rows)
    }
}

/// Bounds a driver call by `limit` plus a fixed grace period.
async fn bounded<T, F>(limit: Duration, fut: F) -> Result<T, DriverError>
where
    F: Future<Output = Result<T, DriverError>>,
{
    match tokio::time::timeout(limit.saturating_add(DRIVER_GRACE), fut).await {
        Ok(result) => result,
        Err(_) => Err(DriverError::Timeout(limit)),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::scripted::{data_row, ScriptedDriver, ScriptedPage};
    use crate::session::{decode, encode, CredentialToken};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const URL: &str = "https://table.example/list?page=1";

    fn session() -> SessionHandle {
        decode(&encode(&[CredentialToken::new("sid", "abc")])).unwrap()
    }

    fn engine() -> FetchEngine {
        FetchEngine::new(FetchSettings::default(), &mut StdRng::seed_from_u64(3))
    }

    fn page(final_url: Option<&str>, title: &str) -> ScriptedPage {
        ScriptedPage::Page {
            final_url: final_url.map(String::from),
            title: title.to_string(),
            table: None,
        }
    }

    #[tokio::test]
    async fn fetch_extracts_rows() {
        let mut driver = ScriptedDriver::new().with_table(
            URL,
            vec![
                data_row("1", "example.com", "93.184.216.34"),
                data_row("2", "", "10.0.0.2"),
                data_row("3", "", ""),
            ],
        );
        let rows = engine().fetch(&mut driver, &session(), URL).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].unique_id, "1-example.com");
        assert_eq!(rows[0].source_url, URL);
        assert!(rows[0].scraped_at.ends_with('Z'));
        assert_eq!(rows[1].ip_address, "10.0.0.2");
    }

    #[tokio::test]
    async fn session_and_fingerprint_applied_once() {
        let second = "https://table.example/list?page=2";
        let mut driver = ScriptedDriver::new()
            .with_table(URL, vec![data_row("1", "a.example", "")])
            .with_table(second, vec![data_row("2", "b.example", "")]);
        let mut engine = engine();
        let session = session();
        engine.fetch(&mut driver, &session, URL).await.unwrap();
        engine.fetch(&mut driver, &session, second).await.unwrap();
        assert_eq!(driver.credential_calls, 1);
        assert_eq!(driver.fingerprint_calls, 1);
        assert_eq!(driver.applied_tokens.len(), 1);
        assert_eq!(driver.fingerprint.as_ref(), Some(engine.fingerprint()));
    }

    #[tokio::test]
    async fn challenge_title_short_circuits() {
        let mut driver = ScriptedDriver::new().with_page(URL, page(None, "Security Check"));
        let err = engine().fetch(&mut driver, &session(), URL).await.unwrap_err();
        assert_eq!(err.kind, FailureKind::ChallengeDetected);
    }

    #[tokio::test]
    async fn challenge_checked_before_table() {
        // A challenge page that happens to contain a table is still a challenge.
        let mut driver = ScriptedDriver::new().with_page(
            URL,
            ScriptedPage::Page {
                final_url: Some("https://table.example/captcha?r=1".to_string()),
                title: "Just a moment".to_string(),
                table: Some(vec![]),
            },
        );
        let err = engine().fetch(&mut driver, &session(), URL).await.unwrap_err();
        assert_eq!(err.kind, FailureKind::ChallengeDetected);
    }

    #[tokio::test]
    async fn login_redirect_is_session_expired() {
        let mut driver = ScriptedDriver::new().with_page(
            URL,
            page(Some("https://table.example/login?next=%2Flist"), "Welcome back"),
        );
        let err = engine().fetch(&mut driver, &session(), URL).await.unwrap_err();
        assert_eq!(err.kind, FailureKind::SessionExpired);
    }

    #[tokio::test]
    async fn missing_table_is_table_not_found() {
        let mut driver = ScriptedDriver::new().with_page(URL, page(None, "Top Domains"));
        let err = engine().fetch(&mut driver, &session(), URL).await.unwrap_err();
        assert_eq!(err.kind, FailureKind::TableNotFound);
    }

    #[tokio::test]
    async fn driver_timeout_is_timeout() {
        let mut driver = ScriptedDriver::new().with_page(URL, ScriptedPage::NavTimeout);
        let err = engine().fetch(&mut driver, &session(), URL).await.unwrap_err();
        assert_eq!(err.kind, FailureKind::Timeout);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_driver_is_bounded() {
        let mut driver = ScriptedDriver::new().with_page(URL, ScriptedPage::Hang);
        let err = engine().fetch(&mut driver, &session(), URL).await.unwrap_err();
        assert_eq!(err.kind, FailureKind::Timeout);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_title_is_bounded() {
        let mut driver = ScriptedDriver::new().with_page(URL, ScriptedPage::StalledTitle);
        let started = tokio::time::Instant::now();
        let err = engine().fetch(&mut driver, &session(), URL).await.unwrap_err();
        assert_eq!(err.kind, FailureKind::Timeout);
        let limit = FetchSettings::default().navigation_timeout + DRIVER_GRACE;
        assert!(started.elapsed() >= limit);
        assert!(started.elapsed() < limit + Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_extraction_is_bounded() {
        let mut driver = ScriptedDriver::new().with_page(URL, ScriptedPage::StalledTable);
        let started = tokio::time::Instant::now();
        let err = engine().fetch(&mut driver, &session(), URL).await.unwrap_err();
        assert_eq!(err.kind, FailureKind::Timeout);
        let limit = FetchSettings::default().table_timeout + DRIVER_GRACE;
        assert!(started.elapsed() >= limit);
        assert!(started.elapsed() < limit + Duration::from_secs(1));
        assert_eq!(driver.visited, vec![URL.to_string()]);
    }

    #[tokio::test]
    async fn driver_panic_becomes_unknown() {
        let mut driver = ScriptedDriver::new().with_page(URL, ScriptedPage::Panic);
        let err = engine().fetch(&mut driver, &session(), URL).await.unwrap_err();
        assert_eq!(err.kind, FailureKind::Unknown);
        assert!(err.message.contains("scripted driver crash"));
    }

    #[tokio::test]
    async fn navigation_error_is_unknown_with_message() {
        let mut driver =
            ScriptedDriver::new().with_page(URL, ScriptedPage::Fail("connection reset".into()));
        let err = engine().fetch(&mut driver, &session(), URL).await.unwrap_err();
        assert_eq!(err.kind, FailureKind::Unknown);
        assert!(err.message.contains("connection reset"));
    }
}
