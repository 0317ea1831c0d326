use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_session::async_trait;
use reqwest::{Client, redirect::Policy};
use sea_orm::{DatabaseConnection, EntityTrait};
use tempfile::TempDir;

use carshow_votes::config::Config;
use carshow_votes::database::{setup_database, setup_session_store};
use carshow_votes::entities::{prelude::*, show, show_car};
use carshow_votes::router::{AppState, create_router};
use carshow_votes::store;
use carshow_votes::stripe::{
    CheckoutSession, NewCheckoutSession, PaymentError, PaymentProvider, PaymentStatus,
};

pub const ADMIN_PASSWORD: &str = "test-admin-password";
pub const WEBHOOK_SECRET: &str = "whsec_test_secret";

/// In-memory stand-in for the hosted checkout. Sessions start unpaid;
/// tests flip them with [`FakeProvider::mark_paid`].
#[derive(Default)]
pub struct FakeProvider {
    sessions: Mutex<HashMap<String, CheckoutSession>>,
    counter: AtomicU32,
}

impl FakeProvider {
    pub fn insert(&self, session: CheckoutSession) {
        self.sessions
            .lock()
            .unwrap()
            .insert(session.id.clone(), session);
    }

    pub fn mark_paid(&self, session_id: &str) {
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions.get_mut(session_id).expect("unknown session");
        session.payment_status = PaymentStatus::Paid;
    }

    pub fn created(&self) -> Vec<CheckoutSession> {
        let mut sessions: Vec<_> = self.sessions.lock().unwrap().values().cloned().collect();
        sessions.sort_by(|a, b| a.id.cmp(&b.id));
        sessions
    }
}

#[async_trait]
impl PaymentProvider for FakeProvider {
    async fn create_checkout_session(
        &self,
        request: &NewCheckoutSession,
    ) -> Result<CheckoutSession, PaymentError> {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        let id = format!("cs_test_{n:04}");
        let session = CheckoutSession {
            id: id.clone(),
            url: Some(format!("https://checkout.stripe.test/pay/{id}")),
            payment_status: PaymentStatus::Unpaid,
            amount_total: Some(request.line_item.unit_amount_cents * request.line_item.quantity),
            metadata: request.metadata.clone().into_iter().collect(),
        };
        self.insert(session.clone());
        Ok(session)
    }

    async fn retrieve_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<CheckoutSession, PaymentError> {
        self.sessions
            .lock()
            .unwrap()
            .get(session_id)
            .cloned()
            .ok_or_else(|| PaymentError::Api {
                status: 404,
                message: format!("No such checkout.session: {session_id}"),
            })
    }
}

pub fn vote_session(
    id: &str,
    status: PaymentStatus,
    show_id: i32,
    show_car_id: i32,
    category: &str,
    vote_qty: i32,
) -> CheckoutSession {
    let metadata = [
        ("kind", "vote".to_string()),
        ("show_id", show_id.to_string()),
        ("show_car_id", show_car_id.to_string()),
        ("category", category.to_string()),
        ("vote_qty", vote_qty.to_string()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();
    CheckoutSession {
        id: id.to_string(),
        url: None,
        payment_status: status,
        amount_total: Some(i64::from(vote_qty) * 100),
        metadata,
    }
}

/// A migrated, seeded SQLite database in a temporary directory.
pub struct TestDb {
    pub db: DatabaseConnection,
    _dir: TempDir,
}

impl TestDb {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("votes.db").display());
        let db = setup_database(&url)
            .await
            .expect("Failed to set up test database");
        Self { db, _dir: dir }
    }

    pub async fn active_show(&self) -> show::Model {
        store::show::get_active_show(&self.db)
            .await
            .unwrap()
            .expect("default show is seeded")
    }

    /// Placeholder cars `1..=count` in the active show, ordered by number.
    pub async fn cars(&self, count: i32) -> Vec<show_car::Model> {
        let show = self.active_show().await;
        store::car::create_placeholder_cars(&self.db, show.id, 1, count)
            .await
            .unwrap();
        let mut cars = ShowCar::find().all(&self.db).await.unwrap();
        cars.sort_by_key(|car| car.car_number);
        cars
    }
}

fn project_dir(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join(name)
        .display()
        .to_string()
}

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        port: 0,
        admin_password: ADMIN_PASSWORD.to_string(),
        session_secret: "test-session-secret".to_string(),
        stripe_secret_key: Some("sk_test_fake".to_string()),
        stripe_webhook_secret: Some(WEBHOOK_SECRET.to_string()),
        base_url: None,
        voting_end: None,
        templates_dir: project_dir("templates"),
        static_dir: project_dir("static"),
    }
}

/// A running server backed by a fresh database and a [`FakeProvider`].
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub db: DatabaseConnection,
    pub provider: Arc<FakeProvider>,
    test_db: TestDb,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    pub async fn spawn_with(customize: impl FnOnce(&mut Config)) -> Self {
        let test_db = TestDb::new().await;
        let db = test_db.db.clone();
        let mut config = test_config();
        customize(&mut config);

        let provider = Arc::new(FakeProvider::default());
        let payments: Arc<dyn PaymentProvider> = provider.clone();
        let session_store = setup_session_store(&db)
            .await
            .expect("Failed to set up session store");
        let state = AppState::new(db.clone(), config, Some(payments));
        let app = create_router(state, session_store);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = Client::builder()
            .cookie_store(true)
            .redirect(Policy::none())
            .build()
            .unwrap();

        Self {
            addr,
            client,
            db,
            provider,
            test_db,
        }
    }

    pub async fn active_show(&self) -> show::Model {
        self.test_db.active_show().await
    }

    pub async fn cars(&self, count: i32) -> Vec<show_car::Model> {
        self.test_db.cars(count).await
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request")
    }

    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("Failed to send POST request")
    }

    pub async fn text(&self, path: &str) -> String {
        self.get(path).await.text().await.expect("Failed to read body")
    }

    pub async fn login(&self) {
        let res = self
            .post_form("/admin/login", &[("password", ADMIN_PASSWORD), ("next", "")])
            .await;
        assert_eq!(res.status(), 303);
    }
}

pub fn location(res: &reqwest::Response) -> String {
    res.headers()
        .get(reqwest::header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
