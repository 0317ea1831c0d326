use chrono::Utc;
use hmac::{Hmac, Mac};
use sea_orm::{EntityTrait, ModelTrait};
use sha2::Sha256;

use carshow_votes::entities::{donation::DonationStatus, prelude::*};
use carshow_votes::store;
use carshow_votes::stripe::webhook::SIGNATURE_HEADER;

use crate::common::{TestApp, WEBHOOK_SECRET, location};

const SLUG: &str = "karman-charity-show";

fn owner_form<'a>(number: &'a str) -> Vec<(&'static str, &'a str)> {
    vec![
        ("name", "Pat Driver"),
        ("phone", "555-0100"),
        ("email", "pat@example.com"),
        ("opt_in_future", "on"),
        ("car_number", number),
        ("year", "1967"),
        ("make", "Chevrolet"),
        ("model", "Camaro"),
    ]
}

#[tokio::test]
async fn registration_creates_car_and_print_sheet() {
    let app = TestApp::spawn().await;
    assert_eq!(app.get("/register").await.status(), 200);

    let res = app.post_form("/register", &owner_form("12")).await;
    assert_eq!(res.status(), 303);
    let sheet = location(&res);
    assert!(sheet.starts_with(&format!("/r/{SLUG}/")));

    // Rendered URLs are HTML-escaped, so match on path segments only.
    let body = app.text(&sheet).await;
    assert!(body.contains("Car #12"));
    assert!(body.contains("checkin"));
    assert!(body.contains("peoples-choice"));

    let show = app.active_show().await;
    let car = store::car::find_by_number(&app.db, show.id, 12)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(car.make, "Chevrolet");
    let owner = car.find_related(Person).one(&app.db).await.unwrap().unwrap();
    assert_eq!(owner.name, "Pat Driver");
    assert!(owner.opt_in_future);
}

#[tokio::test]
async fn registration_rerenders_on_bad_input() {
    let app = TestApp::spawn().await;
    app.post_form("/register", &owner_form("7")).await;

    let res = app.post_form("/register", &owner_form("7")).await;
    assert_eq!(res.status(), 200);
    assert!(res.text().await.unwrap().contains("Car #7 is already registered"));

    let res = app.post_form("/register", &owner_form("seven")).await;
    assert_eq!(res.status(), 200);
    assert!(res.text().await.unwrap().contains("Car number must be a positive number."));

    let res = app.post_form("/register", &[("name", "Pat")]).await;
    assert_eq!(res.status(), 200);
    assert!(res.text().await.unwrap().contains("Please fill out all required fields."));
}

#[tokio::test]
async fn checkin_fills_in_a_placeholder_car() {
    let app = TestApp::spawn().await;
    let car = app.cars(1).await.remove(0);
    let path = format!("/checkin/{SLUG}/{}", car.car_token);
    assert_eq!(app.get(&path).await.status(), 200);

    let res = app.post_form(&path, &[("name", "Sam")]).await;
    assert!(res.text().await.unwrap().contains("Please fill out all required fields."));

    let mut form = owner_form("");
    form.retain(|(key, _)| *key != "car_number");
    let res = app.post_form(&path, &form).await;
    assert_eq!(res.status(), 200);
    assert!(res.text().await.unwrap().contains("Check-in complete."));

    let updated = store::car::find_by_token(&app.db, car.show_id, &car.car_token)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.model, "Camaro");
    assert!(updated.person_id.is_some());

    assert_eq!(app.get(&format!("/waiver/{SLUG}/{}", car.car_token)).await.status(), 200);
    assert_eq!(app.get(&format!("/checkin/{SLUG}/nope")).await.status(), 404);
}

async fn sign_up_attendee(app: &TestApp, phone: &str) -> String {
    let res = app
        .post_form(
            &format!("/attend/{SLUG}"),
            &[
                ("first_name", "Alex"),
                ("last_name", "Rivera"),
                ("phone", phone),
                ("zip", "66111"),
                ("updates_opt_in", "on"),
            ],
        )
        .await;
    assert_eq!(res.status(), 303);
    let to = location(&res);
    assert!(to.starts_with(&format!("/attend/{SLUG}/donate/")));
    to.rsplit('/').next().unwrap().to_string()
}

#[tokio::test]
async fn attendee_signup_tracks_optional_fields() {
    let app = TestApp::spawn().await;
    assert_eq!(app.get(&format!("/attend/{SLUG}")).await.status(), 200);

    let res = app
        .post_form(&format!("/attend/{SLUG}"), &[("first_name", "Alex")])
        .await;
    assert_eq!(res.status(), 200);
    assert!(res.text().await.unwrap().contains("First and last name are required."));

    sign_up_attendee(&app, "555-0199").await;

    let attendees = Attendee::find().all(&app.db).await.unwrap();
    assert_eq!(attendees.len(), 1);
    assert!(attendees[0].updates_opt_in);
    assert!(!attendees[0].sponsor_opt_in);

    let mut metrics: Vec<(String, bool)> = FieldMetric::find()
        .all(&app.db)
        .await
        .unwrap()
        .into_iter()
        .map(|m| (m.field_name, m.provided))
        .collect();
    metrics.sort();
    assert_eq!(
        metrics,
        [("email".to_string(), false), ("phone".to_string(), true)]
    );
}

#[tokio::test]
async fn zero_donation_is_recorded_as_skipped() {
    let app = TestApp::spawn().await;
    let attendee_id = sign_up_attendee(&app, "").await;

    let res = app
        .post_form(
            "/attend/create-donation-checkout",
            &[
                ("show_slug", SLUG),
                ("attendee_id", &attendee_id),
                ("amount_dollars", "0"),
            ],
        )
        .await;
    assert_eq!(res.status(), 303);
    assert_eq!(location(&res), format!("/attend/{SLUG}/done"));
    assert!(app.provider.created().is_empty());

    let donations = Donation::find().all(&app.db).await.unwrap();
    assert_eq!(donations.len(), 1);
    assert_eq!(donations[0].status, DonationStatus::Skipped);
    assert_eq!(donations[0].amount_cents, 0);
}

#[tokio::test]
async fn paid_donation_is_marked_on_return() {
    let app = TestApp::spawn().await;
    let attendee_id = sign_up_attendee(&app, "555-0101").await;

    let res = app
        .post_form(
            "/attend/create-donation-checkout",
            &[
                ("show_slug", SLUG),
                ("attendee_id", &attendee_id),
                ("amount_dollars", "25"),
            ],
        )
        .await;
    assert_eq!(res.status(), 303);
    assert!(location(&res).starts_with("https://checkout.stripe.test/pay/"));

    let session = app.provider.created().remove(0);
    assert_eq!(session.metadata["kind"], "donation");
    assert_eq!(session.metadata["show_slug"], SLUG);
    assert_eq!(session.amount_total, Some(2500));

    let donation = Donation::find().one(&app.db).await.unwrap().unwrap();
    assert_eq!(donation.status, DonationStatus::Pending);
    assert_eq!(donation.stripe_session_id.as_deref(), Some(session.id.as_str()));

    app.provider.mark_paid(&session.id);
    let res = app
        .get(&format!("/donation-success?session_id={}", session.id))
        .await;
    assert_eq!(res.status(), 303);
    assert_eq!(location(&res), format!("/attend/{SLUG}/done"));

    let donation = Donation::find().one(&app.db).await.unwrap().unwrap();
    assert_eq!(donation.status, DonationStatus::Paid);
    assert!(donation.paid_at.is_some());
    assert!(Vote::find().all(&app.db).await.unwrap().is_empty());
}

#[tokio::test]
async fn donation_webhook_marks_donation_paid() {
    let app = TestApp::spawn().await;
    let attendee_id = sign_up_attendee(&app, "").await;
    app.post_form(
        "/attend/create-donation-checkout",
        &[
            ("show_slug", SLUG),
            ("attendee_id", &attendee_id),
            ("amount_dollars", "$10.50"),
        ],
    )
    .await;
    let session = app.provider.created().remove(0);
    app.provider.mark_paid(&session.id);

    let payload = format!(
        r#"{{"type":"checkout.session.completed","data":{{"object":{{"id":"{}"}}}}}}"#,
        session.id
    );
    let timestamp = Utc::now().timestamp();
    let mut mac = Hmac::<Sha256>::new_from_slice(WEBHOOK_SECRET.as_bytes()).unwrap();
    mac.update(format!("{timestamp}.{payload}").as_bytes());
    let signature = format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()));

    let res = app
        .client
        .post(app.url("/stripe/webhook"))
        .header(SIGNATURE_HEADER, signature)
        .body(payload)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let donation = Donation::find().one(&app.db).await.unwrap().unwrap();
    assert_eq!(donation.status, DonationStatus::Paid);
    assert_eq!(donation.amount_cents, 1050);
    assert!(Vote::find().all(&app.db).await.unwrap().is_empty());
}

#[tokio::test]
async fn donation_for_unknown_attendee_is_rejected() {
    let app = TestApp::spawn().await;
    let res = app
        .post_form(
            "/attend/create-donation-checkout",
            &[
                ("show_slug", SLUG),
                ("attendee_id", "999"),
                ("amount_dollars", "5"),
            ],
        )
        .await;
    assert_eq!(res.status(), 400);
    assert!(Donation::find().all(&app.db).await.unwrap().is_empty());
}
