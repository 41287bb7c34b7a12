use async_graphql::EmptySubscription;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::admin_mutations::{AdminMutation, AdminQuery};
use crate::authz::Authorizer;
use crate::settings::Session as SessionCfg;

pub type AdminSchema = async_graphql::Schema<AdminQuery, AdminMutation, EmptySubscription>;

/// Build the admin GraphQL schema for role, assignment, session and job management
pub fn build_admin_schema(
    authz: Authorizer,
    db: DatabaseConnection,
    session_cfg: SessionCfg,
) -> AdminSchema {
    async_graphql::Schema::build(AdminQuery, AdminMutation, EmptySubscription)
        .data(authz)
        .data(Arc::new(db))
        .data(session_cfg)
        .finish()
}

#[derive(Clone)]
pub struct AdminState {
    pub schema: AdminSchema,
}

/// Admin GraphQL POST handler
async fn admin_handler(
    State(state): State<Arc<AdminState>>,
    req: GraphQLRequest,
) -> GraphQLResponse {
    state.schema.execute(req.into_inner()).await.into()
}

/// GraphQL playground (GraphiQL) handler
async fn admin_playground() -> impl IntoResponse {
    axum::response::Html(
        async_graphql::http::GraphiQLSource::build()
            .endpoint("/admin/graphql")
            .finish(),
    )
}

/// Create the admin API router
pub fn router(schema: AdminSchema) -> Router {
    let state = Arc::new(AdminState { schema });

    Router::new()
        .route("/admin/graphql", post(admin_handler))
        .route("/admin/playground", get(admin_playground))
        .with_state(state)
}
