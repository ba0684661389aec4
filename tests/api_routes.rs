use axum::http::{HeaderName, HeaderValue, StatusCode, header::AUTHORIZATION};
use axum_test::{TestRequest, TestServer};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde_json::{Value, json};
use tokio::sync::mpsc::UnboundedReceiver;
use uuid::Uuid;

use agritrust_backend::{
    config::{AppState, Config},
    create_app,
    db::{InMemoryStore, Repositories},
    services::notification_service::{Notification, NotificationDispatcher},
};

const PUBLIC_PEM: &str = include_str!("fixtures/issuer_public.pem");
const PRIVATE_PEM: &str = include_str!("fixtures/issuer_private.pem");
const FOREIGN_PEM: &str = include_str!("fixtures/foreign_private.pem");

struct TestApp {
    server: TestServer,
    notifications: UnboundedReceiver<Notification>,
}

fn setup_test_app() -> TestApp {
    let config = Config {
        database_url: "postgres://unused".into(),
        clerk_public_key: PUBLIC_PEM.into(),
        resend_api_key: None,
        mail_from: "AgriTrust <test@example.com>".into(),
        alert_recipients: vec![],
        frontend_url: "http://front".into(),
        bind_addr: "127.0.0.1:0".into(),
        database_max_connections: 1,
    };
    let (dispatcher, notifications) = NotificationDispatcher::channel();
    let app_state = AppState::new(&config, Repositories::in_memory(InMemoryStore::new()), dispatcher)
        .expect("app state");

    TestApp {
        server: TestServer::new(create_app(app_state)).expect("Failed to create TestServer"),
        notifications,
    }
}

fn sign(private_pem: &str, sub: &str, role: &str) -> String {
    let claims = json!({
        "sub": sub,
        "exp": chrono::Utc::now().timestamp() + 3600,
        "public_metadata": { "role": role },
    });
    let key = EncodingKey::from_rsa_pem(private_pem.as_bytes()).unwrap();
    encode(&Header::new(Algorithm::RS256), &claims, &key).unwrap()
}

fn admin_token(sub: &str) -> String {
    sign(PRIVATE_PEM, sub, "admin")
}

fn operator_token(sub: &str) -> String {
    sign(PRIVATE_PEM, sub, "operator")
}

fn bearer(request: TestRequest, token: &str) -> TestRequest {
    request.add_header(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    )
}

fn in_tenant(request: TestRequest, tenant_id: &str) -> TestRequest {
    request.add_header(
        HeaderName::from_static("x-tenant-id"),
        HeaderValue::from_str(tenant_id).unwrap(),
    )
}

fn id_of(body: &Value) -> String {
    body["id"].as_str().expect("id should be a string").to_string()
}

async fn create_tenant(server: &TestServer, token: &str, name: &str) -> String {
    let res = bearer(server.post("/api/tenants"), token)
        .json(&json!({ "name": name }))
        .await;
    assert_eq!(res.status_code(), StatusCode::CREATED);
    id_of(&res.json::<Value>())
}

async fn create_farm(server: &TestServer, token: &str, tenant: &str) -> String {
    let res = in_tenant(bearer(server.post("/api/farms"), token), tenant)
        .json(&json!({ "name": "Rancho El Sol", "totalArea": 120.5, "ownershipType": "own" }))
        .await;
    assert_eq!(res.status_code(), StatusCode::CREATED);
    id_of(&res.json::<Value>())
}

async fn create_batch(server: &TestServer, token: &str, tenant: &str, farm_id: &str) -> String {
    let crop = in_tenant(bearer(server.post("/api/crops"), token), tenant)
        .json(&json!({ "farmId": farm_id, "name": "Fresa", "variety": "Albion" }))
        .await;
    assert_eq!(crop.status_code(), StatusCode::CREATED);

    let batch = in_tenant(bearer(server.post("/api/harvest-batches"), token), tenant)
        .json(&json!({ "cropId": id_of(&crop.json::<Value>()), "totalBins": 0 }))
        .await;
    assert_eq!(batch.status_code(), StatusCode::CREATED);
    id_of(&batch.json::<Value>())
}

async fn scan(server: &TestServer, token: &str, tenant: &str, qr: &str, batch_id: &str, weight: f64) -> Value {
    let res = in_tenant(bearer(server.post("/api/bins/scan"), token), tenant)
        .json(&json!({ "qrCode": qr, "harvestBatchId": batch_id, "weightKg": weight }))
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);
    res.json::<Value>()
}

fn drain(rx: &mut UnboundedReceiver<Notification>) -> Vec<Notification> {
    let mut out = Vec::new();
    while let Ok(n) = rx.try_recv() {
        out.push(n);
    }
    out
}

#[tokio::test]
async fn health_is_public() {
    let app = setup_test_app();
    let res = app.server.get("/api/health").await;

    assert_eq!(res.status_code(), StatusCode::OK);
    let body = res.json::<Value>();
    assert_eq!(body["status"], "online");
    assert_eq!(body["system"], "AgriTrust Backend");
}

#[tokio::test]
async fn missing_or_foreign_tokens_are_unauthorized() {
    let app = setup_test_app();

    let no_token = app.server.get("/api/farms").await;
    assert_eq!(no_token.status_code(), StatusCode::UNAUTHORIZED);

    let foreign = sign(FOREIGN_PEM, "intruder", "admin");
    let res = bearer(app.server.get("/api/tenants"), &foreign).await;
    assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn operator_is_forbidden_on_admin_routes() {
    let app = setup_test_app();
    let operator = operator_token("op_1");

    let res = bearer(app.server.post("/api/tenants"), &operator)
        .json(&json!({ "name": "Agrícola Op" }))
        .await;
    assert_eq!(res.status_code(), StatusCode::FORBIDDEN);

    let res = bearer(app.server.get("/api/dashboard/stats"), &operator).await;
    assert_eq!(res.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn other_tenants_are_not_found() {
    let app = setup_test_app();
    let alice = admin_token("alice");
    let bob = admin_token("bob");

    let tenant_a = create_tenant(&app.server, &alice, "Agrícola A").await;
    let _tenant_b = create_tenant(&app.server, &bob, "Agrícola B").await;

    let res = in_tenant(bearer(app.server.get("/api/farms"), &bob), &tenant_a).await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);

    let res = in_tenant(bearer(app.server.get("/api/farms"), &bob), "not-a-uuid").await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);

    // Query string também resolve o escopo
    let res = bearer(app.server.get(&format!("/api/farms?tenant_id={}", tenant_a)), &alice).await;
    assert_eq!(res.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn malformed_bodies_are_json_bad_requests() {
    let app = setup_test_app();
    let admin = admin_token("owner");

    let missing = bearer(app.server.post("/api/tenants"), &admin)
        .json(&json!({ "taxId": "RFC123" }))
        .await;
    assert_eq!(missing.status_code(), StatusCode::BAD_REQUEST);
    assert!(missing.json::<Value>()["error"].is_string());

    let tenant = create_tenant(&app.server, &admin, "Agrícola Tipos").await;
    let wrong_type = in_tenant(bearer(app.server.post("/api/farms"), &admin), &tenant)
        .json(&json!({ "name": "Rancho", "totalArea": "muito", "ownershipType": "own" }))
        .await;
    assert_eq!(wrong_type.status_code(), StatusCode::BAD_REQUEST);
    assert!(wrong_type.json::<Value>()["details"].is_string());
}

#[tokio::test]
async fn invite_can_be_accepted_only_once() {
    let mut app = setup_test_app();
    let admin = admin_token("owner");
    let tenant = create_tenant(&app.server, &admin, "Agrícola Equipe").await;

    let res = in_tenant(bearer(app.server.post("/api/team/invite"), &admin), &tenant)
        .json(&json!({ "email": "op@campo.mx", "role": "operator" }))
        .await;
    assert_eq!(res.status_code(), StatusCode::CREATED);
    assert!(res.json::<Value>().get("token").is_none());

    let token = drain(&mut app.notifications)
        .into_iter()
        .find_map(|n| match n {
            Notification::TeamInvite { link, .. } => {
                link.split("token=").nth(1).map(str::to_string)
            }
            _ => None,
        })
        .expect("invite email should be queued");

    let operator = operator_token("op_1");
    let joined = bearer(app.server.post("/api/team/join"), &operator)
        .json(&json!({ "token": token }))
        .await;
    assert_eq!(joined.status_code(), StatusCode::OK);
    assert_eq!(joined.json::<Value>()["tenantId"], tenant.as_str());

    let again = bearer(app.server.post("/api/team/join"), &operator)
        .json(&json!({ "token": token }))
        .await;
    assert_eq!(again.status_code(), StatusCode::NOT_FOUND);

    // O novo membro enxerga a empresa sem precisar informar o escopo
    let farms = bearer(app.server.get("/api/farms"), &operator).await;
    assert_eq!(farms.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn banned_chemical_is_blocked_and_alerted() {
    let mut app = setup_test_app();
    let admin = admin_token("owner");
    let tenant = create_tenant(&app.server, &admin, "Agrícola Química").await;
    let farm_id = create_farm(&app.server, &admin, &tenant).await;

    let chemical = in_tenant(bearer(app.server.post("/api/chemicals"), &admin), &tenant)
        .json(&json!({ "name": "ParaXYZ", "isBanned": true, "bannedMarkets": "EU,USA" }))
        .await;
    assert_eq!(chemical.status_code(), StatusCode::CREATED);
    let chemical_id = id_of(&chemical.json::<Value>());

    let res = in_tenant(bearer(app.server.post("/api/applications"), &admin), &tenant)
        .json(&json!({ "farmId": farm_id, "chemicalId": chemical_id, "dosage": 1.5, "unit": "L/ha" }))
        .await;
    assert_eq!(res.status_code(), StatusCode::FORBIDDEN);
    let text = res.text();
    assert!(text.contains("ParaXYZ"));
    assert!(text.contains("EU,USA"));

    let alerts: Vec<_> = drain(&mut app.notifications)
        .into_iter()
        .filter(|n| matches!(n, Notification::SecurityAlert { .. }))
        .collect();
    assert_eq!(alerts.len(), 1);

    let applications = in_tenant(bearer(app.server.get("/api/applications"), &admin), &tenant).await;
    assert_eq!(applications.json::<Value>().as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn banned_chemical_with_unknown_farm_is_still_blocked() {
    let mut app = setup_test_app();
    let admin = admin_token("owner");
    let tenant = create_tenant(&app.server, &admin, "Agrícola Química").await;

    let chemical = in_tenant(bearer(app.server.post("/api/chemicals"), &admin), &tenant)
        .json(&json!({ "name": "ParaXYZ", "isBanned": true, "bannedMarkets": "EU,USA" }))
        .await;
    let chemical_id = id_of(&chemical.json::<Value>());

    let res = in_tenant(bearer(app.server.post("/api/applications"), &admin), &tenant)
        .json(&json!({ "farmId": Uuid::new_v4(), "chemicalId": chemical_id, "dosage": 1.5, "unit": "L/ha" }))
        .await;
    assert_eq!(res.status_code(), StatusCode::FORBIDDEN);

    let alerts = drain(&mut app.notifications)
        .into_iter()
        .filter(|n| matches!(n, Notification::SecurityAlert { .. }))
        .count();
    assert_eq!(alerts, 1);
}

#[tokio::test]
async fn blank_qr_code_is_rejected() {
    let app = setup_test_app();
    let admin = admin_token("owner");
    let tenant = create_tenant(&app.server, &admin, "Agrícola Caixas").await;
    let farm_id = create_farm(&app.server, &admin, &tenant).await;
    let batch_id = create_batch(&app.server, &admin, &tenant, &farm_id).await;

    let res = in_tenant(bearer(app.server.post("/api/bins/scan"), &admin), &tenant)
        .json(&json!({ "qrCode": "   ", "harvestBatchId": batch_id, "weightKg": 10.0 }))
        .await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);

    let bins = in_tenant(bearer(app.server.get("/api/bins"), &admin), &tenant).await;
    assert_eq!(bins.json::<Value>().as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn tenant_in_body_scopes_mobile_writes() {
    let app = setup_test_app();
    let admin = admin_token("owner");
    let _tenant_a = create_tenant(&app.server, &admin, "Agrícola A").await;
    let tenant_b = create_tenant(&app.server, &admin, "Agrícola B").await;
    let farm_id = create_farm(&app.server, &admin, &tenant_b).await;
    let batch_id = create_batch(&app.server, &admin, &tenant_b, &farm_id).await;

    // Sem cabeçalho nem query: vale o tenantId do corpo
    let res = bearer(app.server.post("/api/bins/scan"), &admin)
        .json(&json!({ "qrCode": "QR-B1", "harvestBatchId": batch_id, "weightKg": 18.0, "tenantId": tenant_b }))
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);

    let bins = in_tenant(bearer(app.server.get("/api/bins"), &admin), &tenant_b).await;
    assert_eq!(bins.json::<Value>().as_array().unwrap().len(), 1);

    let chemical = in_tenant(bearer(app.server.post("/api/chemicals"), &admin), &tenant_b)
        .json(&json!({ "name": "Azufre", "isBanned": false }))
        .await;
    let chemical_id = id_of(&chemical.json::<Value>());
    let applied = bearer(app.server.post("/api/applications"), &admin)
        .json(&json!({ "farmId": farm_id, "chemicalId": chemical_id, "dosage": 2, "unit": "kg", "tenantId": tenant_b }))
        .await;
    assert_eq!(applied.status_code(), StatusCode::CREATED);

    // O corpo não abre empresas alheias
    let outsider = admin_token("outsider");
    let _own = create_tenant(&app.server, &outsider, "Agrícola C").await;
    let res = bearer(app.server.post("/api/bins/scan"), &outsider)
        .json(&json!({ "qrCode": "QR-X", "harvestBatchId": batch_id, "weightKg": 1.0, "tenantId": tenant_b }))
        .await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn lease_rules_and_rented_farm() {
    let app = setup_test_app();
    let admin = admin_token("owner");
    let tenant = create_tenant(&app.server, &admin, "Agrícola Terras").await;
    let farm_id = create_farm(&app.server, &admin, &tenant).await;

    let backwards = in_tenant(bearer(app.server.post("/api/land/contracts"), &admin), &tenant)
        .json(&json!({
            "farmId": farm_id,
            "landownerName": "Don Pedro",
            "startDate": "2025-06-01",
            "endDate": "2025-01-01",
            "paymentAmount": 5000,
            "paymentFreq": "yearly",
        }))
        .await;
    assert_eq!(backwards.status_code(), StatusCode::BAD_REQUEST);

    let farms = in_tenant(bearer(app.server.get("/api/farms"), &admin), &tenant).await;
    assert_eq!(farms.json::<Value>()[0]["ownershipType"], "own");

    let created = in_tenant(bearer(app.server.post("/api/land/contracts"), &admin), &tenant)
        .json(&json!({
            "farmId": farm_id,
            "landownerName": "Don Pedro",
            "startDate": "2025-01-01",
            "endDate": "2026-01-01",
            "paymentAmount": 5000,
            "paymentFreq": "yearly",
        }))
        .await;
    assert_eq!(created.status_code(), StatusCode::CREATED);
    assert_eq!(created.json::<Value>()["status"], "active");

    let farms = in_tenant(bearer(app.server.get("/api/farms"), &admin), &tenant).await;
    assert_eq!(farms.json::<Value>()[0]["ownershipType"], "rented");
}

#[tokio::test]
async fn bin_scan_is_idempotent_and_passport_is_public() {
    let app = setup_test_app();
    let admin = admin_token("owner");
    let tenant = create_tenant(&app.server, &admin, "Agrícola Frutas").await;
    let farm_id = create_farm(&app.server, &admin, &tenant).await;
    let batch_id = create_batch(&app.server, &admin, &tenant, &farm_id).await;

    let first = scan(&app.server, &admin, &tenant, "QR-001", &batch_id, 20.0).await;
    let second = scan(&app.server, &admin, &tenant, "QR-001", &batch_id, 22.5).await;
    assert_eq!(first["id"], second["id"]);
    assert_eq!(second["weightKg"].as_f64(), Some(22.5));

    let bins = in_tenant(bearer(app.server.get("/api/bins"), &admin), &tenant).await;
    assert_eq!(bins.json::<Value>().as_array().unwrap().len(), 1);

    let passport = app.server.get("/api/public/passport/QR-001").await;
    assert_eq!(passport.status_code(), StatusCode::OK);
    let body = passport.json::<Value>();
    assert_eq!(body["qrCode"], "QR-001");
    assert_eq!(body["productName"], "Fresa");

    let unknown = app.server.get("/api/public/passport/NOPE").await;
    assert_eq!(unknown.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn shipment_is_all_or_nothing_and_claim_disputes_it() {
    let app = setup_test_app();
    let admin = admin_token("owner");
    let tenant = create_tenant(&app.server, &admin, "Agrícola Logística").await;
    let farm_id = create_farm(&app.server, &admin, &tenant).await;
    let batch_id = create_batch(&app.server, &admin, &tenant, &farm_id).await;
    let bin = id_of(&scan(&app.server, &admin, &tenant, "QR-100", &batch_id, 18.0).await);

    let partial = in_tenant(bearer(app.server.post("/api/shipments"), &admin), &tenant)
        .json(&json!({ "customerName": "Walmart", "binIds": [bin, Uuid::new_v4()] }))
        .await;
    assert_eq!(partial.status_code(), StatusCode::BAD_REQUEST);

    let shipments = in_tenant(bearer(app.server.get("/api/shipments"), &admin), &tenant).await;
    assert_eq!(shipments.json::<Value>().as_array().unwrap().len(), 0);
    let bins = in_tenant(bearer(app.server.get("/api/bins"), &admin), &tenant).await;
    assert_eq!(bins.json::<Value>()[0]["status"], "full_in_field");

    let shipment = in_tenant(bearer(app.server.post("/api/shipments"), &admin), &tenant)
        .json(&json!({ "customerName": "Walmart", "truckPlate": "ABC-123", "binIds": [bin] }))
        .await;
    assert_eq!(shipment.status_code(), StatusCode::CREATED);
    let shipment_id = id_of(&shipment.json::<Value>());

    let bins = in_tenant(bearer(app.server.get("/api/bins"), &admin), &tenant).await;
    assert_eq!(bins.json::<Value>()[0]["status"], "shipped");

    let claim = in_tenant(bearer(app.server.post("/api/claims"), &admin), &tenant)
        .json(&json!({ "shipmentId": shipment_id, "reason": "Fruta golpeada", "amountUsd": 350 }))
        .await;
    assert_eq!(claim.status_code(), StatusCode::CREATED);
    assert_eq!(claim.json::<Value>()["status"], "open");

    let after = in_tenant(
        bearer(app.server.get(&format!("/api/shipments/{}", shipment_id)), &admin),
        &tenant,
    )
    .await;
    assert_eq!(after.json::<Value>()["status"], "disputed");
}

#[tokio::test]
async fn budget_upsert_and_variance_report() {
    let app = setup_test_app();
    let admin = admin_token("owner");
    let tenant = create_tenant(&app.server, &admin, "Agrícola Finanças").await;
    let farm_id = create_farm(&app.server, &admin, &tenant).await;

    let season = in_tenant(bearer(app.server.post("/api/finance/seasons"), &admin), &tenant)
        .json(&json!({ "name": "Temporada 2025", "startDate": "2025-01-01", "endDate": "2025-12-31" }))
        .await;
    assert_eq!(season.status_code(), StatusCode::CREATED);
    let season_id = id_of(&season.json::<Value>());

    let mut categories = Vec::new();
    for name in ["Fertilizantes", "Mano de obra"] {
        let res = in_tenant(bearer(app.server.post("/api/finance/categories"), &admin), &tenant)
            .json(&json!({ "name": name }))
            .await;
        assert_eq!(res.status_code(), StatusCode::CREATED);
        categories.push(id_of(&res.json::<Value>()));
    }

    let budget = json!({
        "seasonId": season_id,
        "farmId": farm_id,
        "costCategoryId": categories[0],
        "month": 3,
        "year": 2025,
        "amount": 1000,
    });
    let created = in_tenant(bearer(app.server.post("/api/finance/budgets"), &admin), &tenant)
        .json(&budget)
        .await;
    assert_eq!(created.status_code(), StatusCode::CREATED);
    let updated = in_tenant(bearer(app.server.post("/api/finance/budgets"), &admin), &tenant)
        .json(&budget)
        .await;
    assert_eq!(updated.status_code(), StatusCode::OK);
    assert_eq!(id_of(&created.json::<Value>()), id_of(&updated.json::<Value>()));

    for (category, amount) in [(&categories[0], 650), (&categories[1], 200)] {
        let res = in_tenant(bearer(app.server.post("/api/finance/expenses"), &admin), &tenant)
            .json(&json!({
                "seasonId": season_id,
                "farmId": farm_id,
                "costCategoryId": category,
                "description": "Factura",
                "amount": amount,
            }))
            .await;
        assert_eq!(res.status_code(), StatusCode::CREATED);
    }

    let report = in_tenant(
        bearer(
            app.server.get(&format!(
                "/api/finance/report/variance?season_id={}&farm_id={}",
                season_id, farm_id
            )),
            &admin,
        ),
        &tenant,
    )
    .await;
    assert_eq!(report.status_code(), StatusCode::OK);
    let rows = report.json::<Value>();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 2);

    assert_eq!(rows[0]["categoryName"], "Fertilizantes");
    assert_eq!(rows[0]["budgeted"].as_f64(), Some(1000.0));
    assert_eq!(rows[0]["spent"].as_f64(), Some(650.0));
    assert_eq!(rows[0]["variance"].as_f64(), Some(350.0));

    assert_eq!(rows[1]["categoryName"], "Mano de obra");
    assert_eq!(rows[1]["budgeted"].as_f64(), Some(0.0));
    assert_eq!(rows[1]["variance"].as_f64(), Some(-200.0));
}

#[tokio::test]
async fn category_cycle_is_rejected() {
    let app = setup_test_app();
    let admin = admin_token("owner");
    let tenant = create_tenant(&app.server, &admin, "Agrícola Contas").await;

    let parent = in_tenant(bearer(app.server.post("/api/finance/categories"), &admin), &tenant)
        .json(&json!({ "name": "Insumos" }))
        .await;
    let parent_id = id_of(&parent.json::<Value>());
    let child = in_tenant(bearer(app.server.post("/api/finance/categories"), &admin), &tenant)
        .json(&json!({ "name": "Fertilizantes", "parentId": parent_id }))
        .await;
    assert_eq!(child.status_code(), StatusCode::CREATED);
    let child_id = id_of(&child.json::<Value>());

    let res = in_tenant(
        bearer(app.server.patch(&format!("/api/finance/categories/{}", parent_id)), &admin),
        &tenant,
    )
    .json(&json!({ "parentId": child_id }))
    .await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);

    let tree = in_tenant(bearer(app.server.get("/api/finance/categories"), &admin), &tenant).await;
    let tree = tree.json::<Value>();
    assert_eq!(tree.as_array().unwrap().len(), 1);
    assert_eq!(tree[0]["name"], "Insumos");
    assert_eq!(tree[0]["children"][0]["name"], "Fertilizantes");
}
