//! Optimization handlers

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use secopt_core::{
    ArchitectureOptimization, ArchitectureRequest, Formulation, ImplementationPlan,
    OptimizationResult, SolverStatus,
};

use crate::{AppError, AppResult, AppState};

#[derive(Debug, Default, Deserialize, Validate)]
pub struct AttributeOptimizationRequest {
    #[serde(default)]
    pub formulation: Formulation,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ArchitectureOptimizationRequest {
    #[validate(range(min = 0.0))]
    pub budget: Option<f64>,
    #[serde(default)]
    pub formulation: Formulation,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct PlanRequest {
    #[validate(range(min = 0.0))]
    pub budget: Option<f64>,
    #[serde(default)]
    pub formulation: Formulation,
    pub owner_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub optimization: ArchitectureOptimization,
    pub plan: ImplementationPlan,
}

/// Request options; an empty body (sent without a JSON content type) means defaults
fn options_or_default<T: Default>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    match payload {
        Ok(Json(req)) => Ok(req),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(T::default()),
        Err(rejection) => Err(AppError::ValidationError(rejection.body_text())),
    }
}

/// Solver diagnostics
pub async fn solver_status(State(state): State<AppState>) -> Json<SolverStatus> {
    Json(state.optimizer.solver_status())
}

/// Optimize one security attribute
pub async fn optimize_attribute(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<AttributeOptimizationRequest>, JsonRejection>,
) -> AppResult<Json<OptimizationResult>> {
    let req = options_or_default(payload)?;
    req.validate()?;

    let result = state.optimizer.optimize_attribute_by_id(id, req.formulation).await?;
    Ok(Json(result))
}

/// Optimize every attribute of an architecture, optionally under a budget
pub async fn optimize_architecture(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<ArchitectureOptimizationRequest>, JsonRejection>,
) -> AppResult<Json<ArchitectureOptimization>> {
    let req = options_or_default(payload)?;
    req.validate()?;

    let request = ArchitectureRequest { budget: req.budget, formulation: req.formulation };
    let result = state.optimizer.optimize_architecture(id, &request).await?;
    Ok(Json(result))
}

/// Optimize an architecture and record the selections as planned implementations
pub async fn create_plan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<PlanRequest>, JsonRejection>,
) -> AppResult<Json<PlanResponse>> {
    let req = options_or_default(payload)?;
    req.validate()?;

    let request = ArchitectureRequest { budget: req.budget, formulation: req.formulation };
    let optimization = state.optimizer.optimize_architecture(id, &request).await?;
    let plan = state
        .optimizer
        .create_implementation_plan(&optimization, req.owner_id)
        .await?;

    Ok(Json(PlanResponse { optimization, plan }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
        Router,
    };
    use serde_json::Value;
    use tower::ServiceExt;
    use uuid::Uuid;

    use secopt_core::models::{
        Architecture, Asset, AttributeKind, AttributeThreatLink, ComplianceStatus, ControlMeasure,
        Level, SecurityAttribute,
    };
    use secopt_core::{MemoryStore, OptimizerConfig, SecurityOptimizer, SolverAdapter, SolverConfig};

    use crate::{create_router, AppState};

    const ARCH: u128 = 0xA0;
    const ATTR: u128 = 0xC0;

    fn id(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    fn seeded_store() -> Arc<MemoryStore> {
        let store = MemoryStore::new();
        store.insert_architecture(Architecture {
            id: id(ARCH),
            name: "billing".to_string(),
            description: Some("customer billing".to_string()),
            risk_tolerance: 5000.0,
        });
        store.insert_asset(Asset {
            id: id(0xB0),
            architecture_id: id(ARCH),
            name: "invoices-db".to_string(),
            criticality: Level::High,
        });
        store.insert_attribute(SecurityAttribute {
            id: id(ATTR),
            asset_id: id(0xB0),
            kind: AttributeKind::Confidentiality,
            compromise_cost: 20_000.0,
            priority: Level::High,
        });
        for (threat, measure, cost, efficacy) in [
            (0x10, 0x21, 100.0, 40.0),
            (0x11, 0x22, 200.0, 50.0),
            (0x11, 0x23, 50.0, 45.0),
        ] {
            store.insert_measure(ControlMeasure {
                id: id(measure),
                code: None,
                name: format!("measure-{:x}", measure),
                nature: "technical".to_string(),
                implementation_cost: cost,
                annual_maintenance_cost: 0.0,
                efficacy,
                duration_days: 10,
            });
            store.link_threat_measure(id(threat), id(measure), 75.0, ComplianceStatus::Compliant);
        }
        for threat in [0x10, 0x11] {
            store.link_attribute_threat(AttributeThreatLink {
                id: Uuid::new_v4(),
                attribute_id: id(ATTR),
                threat_id: id(threat),
                probability: 40.0,
                impact: 70.0,
                impact_cost: 2000.0,
            });
        }
        Arc::new(store)
    }

    fn app_with(store: Arc<MemoryStore>, solver: SolverAdapter) -> Router {
        let optimizer = SecurityOptimizer::new(store, Arc::new(solver), OptimizerConfig::default());
        create_router(AppState { optimizer: Arc::new(optimizer) })
    }

    fn app(store: Arc<MemoryStore>) -> Router {
        app_with(store, SolverAdapter::from_config(&SolverConfig::in_process()))
    }

    fn post(uri: String, body: Option<&str>) -> Request<Body> {
        let builder = Request::builder().method("POST").uri(uri);
        match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health_reports_solver() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = send(app(seeded_store()), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["solver_available"], true);
    }

    #[tokio::test]
    async fn test_solver_status() {
        let request = Request::builder()
            .uri("/api/v1/optimization/solver")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app(seeded_store()), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["available"], true);
        assert_eq!(body["active_backend"], "microlp");
    }

    #[tokio::test]
    async fn test_optimize_attribute_without_body() {
        let uri = format!("/api/v1/optimization/attributes/{}", id(ATTR));
        let (status, body) = send(app(seeded_store()), post(uri, None)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "optimal");
        assert_eq!(body["formulation"], "efficacy_floor");
        assert_eq!(body["selected_measures"].as_array().unwrap().len(), 2);
        assert_eq!(body["total_cost"], 150.0);
    }

    #[tokio::test]
    async fn test_optimize_attribute_coverage() {
        let uri = format!("/api/v1/optimization/attributes/{}", id(ATTR));
        let (status, body) =
            send(app(seeded_store()), post(uri, Some(r#"{"formulation":"coverage"}"#))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["formulation"], "coverage");
        assert_eq!(body["threats_covered"], 2);
    }

    #[tokio::test]
    async fn test_unknown_attribute_is_404() {
        let uri = format!("/api/v1/optimization/attributes/{}", Uuid::new_v4());
        let (status, body) = send(app(seeded_store()), post(uri, None)).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], 404);
    }

    #[tokio::test]
    async fn test_negative_budget_is_rejected() {
        let uri = format!("/api/v1/optimization/architectures/{}", id(ARCH));
        let (status, _) = send(app(seeded_store()), post(uri, Some(r#"{"budget":-10}"#))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_options_are_rejected() {
        let attribute = format!("/api/v1/optimization/attributes/{}", id(ATTR));
        let architecture = format!("/api/v1/optimization/architectures/{}", id(ARCH));
        let plan = format!("/api/v1/optimization/architectures/{}/plan", id(ARCH));
        let cases = [
            (attribute.clone(), r#"{"formulation":"covrage"}"#),
            (attribute, "{not json"),
            (architecture.clone(), r#"{"formulation":"covrage"}"#),
            (architecture.clone(), r#"{"budget":"lots"}"#),
            (architecture, "{not json"),
            (plan, r#"{"owner_id":"nobody"}"#),
        ];

        let store = seeded_store();
        for (uri, body) in cases {
            let (status, response) = send(app(store.clone()), post(uri.clone(), Some(body))).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{} {}", uri, body);
            assert_eq!(response["status"], 400);
        }
        assert!(store.implementations().is_empty());
    }

    #[tokio::test]
    async fn test_optimize_architecture_with_budget() {
        let uri = format!("/api/v1/optimization/architectures/{}", id(ARCH));
        let (status, body) = send(app(seeded_store()), post(uri, Some(r#"{"budget":120}"#))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["successful_optimizations"], 1);
        assert_eq!(body["solver_used"], "microlp");
        assert_eq!(body["global_optimization"]["status"], "optimal");
        assert_eq!(body["global_optimization"]["total_cost"], 50.0);
        assert_eq!(body["summary"]["total_measures"], 2);
    }

    #[tokio::test]
    async fn test_unknown_architecture_is_404() {
        let uri = format!("/api/v1/optimization/architectures/{}", Uuid::new_v4());
        let (status, _) = send(app(seeded_store()), post(uri, None)).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_plan_creates_records() {
        let store = seeded_store();
        let owner = Uuid::new_v4();
        let uri = format!("/api/v1/optimization/architectures/{}/plan", id(ARCH));
        let body = format!(r#"{{"owner_id":"{}"}}"#, owner);

        let (status, body) = send(app(store.clone()), post(uri.clone(), Some(&body))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["plan"]["implementations_created"], 2);
        assert_eq!(body["optimization"]["architecture_name"], "billing");
        let records = store.implementations();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.owner_id == Some(owner)));

        let (_, again) = send(app(store.clone()), post(uri, None)).await;
        assert_eq!(again["plan"]["implementations_created"], 0);
        assert_eq!(again["plan"]["skipped_existing"], 2);
        assert_eq!(store.implementations().len(), 2);
    }

    #[tokio::test]
    async fn test_without_solver() {
        let store = seeded_store();

        let uri = format!("/api/v1/optimization/architectures/{}/plan", id(ARCH));
        let (status, _) = send(app_with(store.clone(), SolverAdapter::unavailable()), post(uri, None)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(store.implementations().is_empty());

        let uri = format!("/api/v1/optimization/attributes/{}", id(ATTR));
        let (status, body) = send(app_with(store, SolverAdapter::unavailable()), post(uri, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "solver_unavailable");
    }
}
