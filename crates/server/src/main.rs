//! Asynaptix Server
//!
//! Axum JSON API over the catalog store, the prompt flows, and the mocked
//! identity provider. Serves the merged catalog with a live SSE feed,
//! write-through create/update for user agents, and one endpoint per flow.

use asynaptix_core::catalog::{
    agent_key, builtin_tools, seed_agents, Agent, AgentFramework, AgentPatch, CatalogStore,
    PriceTier, SecurityRating, StoreSubscription, Tool,
};
use asynaptix_core::db::AsynaptixDb;
use asynaptix_core::error::{FlowError, WriteError};
use asynaptix_core::flows::{self, prompts};
use asynaptix_core::identity::{IdentityProvider, MockIdentity, UserProfile};
use asynaptix_core::llm::HttpChatClient;
use asynaptix_core::models::{LlmProvider, ModelConfig};
use asynaptix_core::remote::SqliteCollection;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Json, Response,
    },
    routing::{get, post},
    Router,
};
use clap::{Parser, Subcommand};
use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use std::{convert::Infallible, net::SocketAddr, sync::Arc};
use tokio::{net::TcpListener, sync::broadcast};
use utoipa::{OpenApi, ToSchema};

/// Application state
struct AppState {
    /// Merged catalog view with the live remote subscription
    store: CatalogStore,
    identity: Arc<dyn IdentityProvider>,
    /// Unified database (documents + prompt templates)
    db: Arc<AsynaptixDb>,
    /// Model the flow endpoints run against
    model: ModelConfig,
    /// Fan-out of catalog snapshots to SSE clients
    catalog_tx: broadcast::Sender<Vec<Agent>>,
    /// Keeps the store observer registered for the server's lifetime
    _catalog_watch: StoreSubscription,
}

type SharedState = Arc<AppState>;

/// Serialize an enum's wire name ("free", "trusted", "LangChain", ...)
fn wire_name<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

// === API Types ===

#[derive(Serialize, ToSchema)]
struct ApiResponse {
    success: bool,
    message: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct AgentDto {
    id: String,
    name: String,
    description: String,
    security_rating: String,
    price: String,
    image_url: String,
    image_hint: String,
    is_user_created: bool,
    framework: Option<String>,
    rating: f64,
    rating_count: u32,
}

impl From<Agent> for AgentDto {
    fn from(agent: Agent) -> Self {
        Self {
            id: agent.id,
            name: agent.name,
            description: agent.description,
            security_rating: wire_name(&agent.security_rating),
            price: wire_name(&agent.price),
            image_url: agent.image_url,
            image_hint: agent.image_hint,
            is_user_created: agent.is_user_created,
            framework: agent.framework.as_ref().map(wire_name),
            rating: agent.rating,
            rating_count: agent.rating_count,
        }
    }
}

#[derive(Serialize, ToSchema)]
struct AgentsListResponse {
    agents: Vec<AgentDto>,
    loading: bool,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct UploadAgentRequest {
    name: String,
    description: String,
    /// "free" or "paid"; defaults to free
    price: Option<String>,
    /// One of the catalog frameworks, e.g. "LangChain"
    framework: Option<String>,
    image_url: Option<String>,
    image_hint: Option<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct UpdateAgentRequest {
    name: Option<String>,
    description: Option<String>,
    /// "trusted" | "verified" | "scanned" | "none"
    security_rating: Option<String>,
    /// "free" or "paid"
    price: Option<String>,
    image_url: Option<String>,
    image_hint: Option<String>,
    framework: Option<String>,
    rating: Option<f64>,
    rating_count: Option<u32>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct ToolDto {
    id: String,
    name: String,
    description: String,
    category: String,
    #[serde(rename = "type")]
    kind: String,
    is_official: bool,
}

impl From<Tool> for ToolDto {
    fn from(tool: Tool) -> Self {
        Self {
            id: tool.id,
            name: tool.name,
            description: tool.description,
            category: wire_name(&tool.category),
            kind: wire_name(&tool.kind),
            is_official: tool.is_official,
        }
    }
}

#[derive(Serialize, ToSchema)]
struct ToolsListResponse {
    tools: Vec<ToolDto>,
}

// === Auth Types ===

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct UserDto {
    uid: String,
    email: String,
    display_name: String,
    photo_url: String,
}

impl From<UserProfile> for UserDto {
    fn from(user: UserProfile) -> Self {
        Self {
            uid: user.uid,
            email: user.email,
            display_name: user.display_name,
            photo_url: user.photo_url,
        }
    }
}

#[derive(Serialize, ToSchema)]
struct MeResponse {
    user: Option<UserDto>,
}

// === Flow Types ===

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct SecurityAssessApiRequest {
    /// Catalog entry to mark as scanned once the assessment completes
    agent_id: Option<String>,
    agent_description: String,
    agent_code: String,
}

// === Settings Types ===

#[derive(Deserialize, ToSchema)]
struct ApiKeysRequest {
    anthropic: Option<String>,
    openai: Option<String>,
    gemini: Option<String>,
    openrouter: Option<String>,
    grok: Option<String>,
    deepseek: Option<String>,
}

#[derive(Serialize, ToSchema)]
struct ProviderInfo {
    id: String,
    name: String,
    default_model: String,
    supports_base_url: bool,
    env_var: String,
}

#[derive(Serialize, ToSchema)]
struct ProvidersResponse {
    providers: Vec<ProviderInfo>,
}

// === Prompt Template Types ===

#[derive(Serialize, ToSchema)]
struct PromptListItem {
    slug: String,
    version: i32,
}

#[derive(Serialize, ToSchema)]
struct PromptListResponse {
    prompts: Vec<PromptListItem>,
}

#[derive(Serialize, ToSchema)]
struct PromptResponse {
    slug: String,
    version: i32,
    content: String,
}

#[derive(Deserialize, ToSchema)]
struct UpdatePromptRequest {
    content: String,
}

#[derive(Serialize, ToSchema)]
struct UpdatePromptResponse {
    success: bool,
    slug: String,
    new_version: i32,
}

// === CLI ===

#[derive(Parser, Clone)]
#[command(author, version, about = "Asynaptix - AI Agent Marketplace Server")]
struct Args {
    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Subcommand, Clone)]
enum CliCommand {
    /// Start the Asynaptix server (default)
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
        /// Database path (defaults to .asynaptix/asynaptix.db)
        #[arg(long)]
        db: Option<String>,
        /// LLM provider for the flow endpoints
        #[arg(long, default_value = "anthropic")]
        provider: String,
        /// Model override (defaults to the provider's default model)
        #[arg(long)]
        model: Option<String>,
    },
}

// === OpenAPI Definition ===

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Asynaptix API",
        version = "1.0.0",
        description = "API for the Asynaptix AI agent marketplace"
    ),
    paths(
        list_agents,
        get_agent,
        upload_agent,
        update_agent,
        list_tools,
        auth_me,
        auth_login,
        auth_logout,
        creation_assist,
        linking_assist,
        security_assess,
        price_suggestion,
        tool_code_suggestion,
        tool_suggestions,
        get_providers,
        save_api_keys,
        list_prompts,
        get_prompt,
        update_prompt
    ),
    components(
        schemas(
            ApiResponse,
            AgentDto,
            AgentsListResponse,
            UploadAgentRequest,
            UpdateAgentRequest,
            ToolDto,
            ToolsListResponse,
            UserDto,
            MeResponse,
            SecurityAssessApiRequest,
            ApiKeysRequest,
            ProviderInfo,
            ProvidersResponse,
            PromptListItem,
            PromptListResponse,
            PromptResponse,
            UpdatePromptRequest,
            UpdatePromptResponse
        )
    ),
    tags(
        (name = "catalog", description = "Agent and tool catalog"),
        (name = "auth", description = "Mocked identity"),
        (name = "flows", description = "Prompt flow invocations"),
        (name = "config", description = "Provider and API key management"),
        (name = "prompts", description = "Prompt template management")
    )
)]
struct ApiDoc;

// === Error Helpers ===

fn fail(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<ApiResponse>) {
    (
        status,
        Json(ApiResponse {
            success: false,
            message: message.into(),
        }),
    )
}

fn write_error(err: WriteError) -> (StatusCode, Json<ApiResponse>) {
    let status = match &err {
        WriteError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
        WriteError::SeedEntry(_) => StatusCode::CONFLICT,
        _ => StatusCode::BAD_GATEWAY,
    };
    fail(status, err.to_string())
}

fn flow_error(err: FlowError) -> (StatusCode, Json<ApiResponse>) {
    let status = match &err {
        FlowError::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::BAD_GATEWAY,
    };
    fail(status, err.to_string())
}

/// Mutations are gated on a signed-in user.
fn require_user(state: &AppState) -> Result<UserProfile, (StatusCode, Json<ApiResponse>)> {
    state
        .identity
        .current_user()
        .ok_or_else(|| fail(StatusCode::UNAUTHORIZED, "Sign in to manage agents"))
}

fn chat_client(state: &AppState) -> Result<HttpChatClient, (StatusCode, Json<ApiResponse>)> {
    state.model.create_client().map_err(|e| {
        fail(
            StatusCode::SERVICE_UNAVAILABLE,
            format!("Model provider unavailable: {e}"),
        )
    })
}

/// Load a prompt override from the database, or fall back to the bundled
/// default.
fn prompt_or_default(state: &AppState, slug: &str, default: &str) -> String {
    state
        .db
        .get_prompt(slug)
        .unwrap_or_else(|_| default.to_string())
}

fn parse_price(value: &str) -> Result<PriceTier, (StatusCode, Json<ApiResponse>)> {
    serde_json::from_value(serde_json::Value::String(value.to_string()))
        .map_err(|_| fail(StatusCode::UNPROCESSABLE_ENTITY, format!("Unknown price tier '{value}'")))
}

fn parse_security_rating(
    value: &str,
) -> Result<SecurityRating, (StatusCode, Json<ApiResponse>)> {
    serde_json::from_value(serde_json::Value::String(value.to_string())).map_err(|_| {
        fail(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("Unknown security rating '{value}'"),
        )
    })
}

fn parse_framework(value: &str) -> Result<AgentFramework, (StatusCode, Json<ApiResponse>)> {
    serde_json::from_value(serde_json::Value::String(value.to_string())).map_err(|_| {
        fail(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("Unknown framework '{value}'"),
        )
    })
}

// === Catalog Handlers ===

/// Merged catalog view
#[utoipa::path(
    get,
    path = "/api/v1/catalog/agents",
    tag = "catalog",
    responses(
        (status = 200, description = "Seed plus user-created agents", body = AgentsListResponse)
    )
)]
async fn list_agents(State(state): State<SharedState>) -> Json<AgentsListResponse> {
    Json(AgentsListResponse {
        agents: state.store.agents().into_iter().map(Into::into).collect(),
        loading: state.store.is_loading(),
    })
}

/// Single catalog entry
#[utoipa::path(
    get,
    path = "/api/v1/catalog/agents/{id}",
    tag = "catalog",
    params(("id" = String, Path, description = "Entry key")),
    responses(
        (status = 200, description = "The entry", body = AgentDto),
        (status = 404, description = "Unknown key", body = ApiResponse)
    )
)]
async fn get_agent(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<AgentDto>, (StatusCode, Json<ApiResponse>)> {
    state
        .store
        .get(&id)
        .map(|agent| Json(agent.into()))
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, format!("No agent '{id}'")))
}

/// Package and upload a new agent
#[utoipa::path(
    post,
    path = "/api/v1/catalog/agents",
    tag = "catalog",
    request_body = UploadAgentRequest,
    responses(
        (status = 201, description = "Entry persisted", body = AgentDto),
        (status = 401, description = "Not signed in", body = ApiResponse),
        (status = 422, description = "Invalid entry", body = ApiResponse)
    )
)]
async fn upload_agent(
    State(state): State<SharedState>,
    Json(req): Json<UploadAgentRequest>,
) -> Result<(StatusCode, Json<AgentDto>), (StatusCode, Json<ApiResponse>)> {
    require_user(&state)?;

    let price = match req.price.as_deref() {
        Some(value) => parse_price(value)?,
        None => PriceTier::Free,
    };
    let framework = match req.framework.as_deref() {
        Some(value) => Some(parse_framework(value)?),
        None => None,
    };

    let agent = Agent {
        id: agent_key(&req.name),
        name: req.name,
        description: req.description,
        security_rating: SecurityRating::None,
        price,
        image_url: req
            .image_url
            .unwrap_or_else(|| "https://picsum.photos/600/400".to_string()),
        image_hint: req.image_hint.unwrap_or_else(|| "abstract agent".to_string()),
        is_user_created: true,
        framework,
        rating: 0.0,
        rating_count: 0,
    };

    state.store.create(&agent).await.map_err(write_error)?;
    Ok((StatusCode::CREATED, Json(agent.into())))
}

/// Partially update an existing agent (merge semantics)
#[utoipa::path(
    patch,
    path = "/api/v1/catalog/agents/{id}",
    tag = "catalog",
    params(("id" = String, Path, description = "Entry key")),
    request_body = UpdateAgentRequest,
    responses(
        (status = 200, description = "Update persisted", body = ApiResponse),
        (status = 401, description = "Not signed in", body = ApiResponse),
        (status = 409, description = "Built-in entry", body = ApiResponse)
    )
)]
async fn update_agent(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateAgentRequest>,
) -> Result<Json<ApiResponse>, (StatusCode, Json<ApiResponse>)> {
    require_user(&state)?;

    let security_rating = match req.security_rating.as_deref() {
        Some(value) => Some(parse_security_rating(value)?),
        None => None,
    };
    let price = match req.price.as_deref() {
        Some(value) => Some(parse_price(value)?),
        None => None,
    };
    let framework = match req.framework.as_deref() {
        Some(value) => Some(parse_framework(value)?),
        None => None,
    };

    let patch = AgentPatch {
        name: req.name,
        description: req.description,
        security_rating,
        price,
        image_url: req.image_url,
        image_hint: req.image_hint,
        framework,
        rating: req.rating,
        rating_count: req.rating_count,
    };

    state.store.update(&id, &patch).await.map_err(write_error)?;
    Ok(Json(ApiResponse {
        success: true,
        message: format!("Agent '{id}' updated"),
    }))
}

/// SSE feed of catalog snapshots with heartbeat
async fn catalog_events(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.catalog_tx.subscribe();

    let stream = stream::unfold(rx, |mut rx| async move {
        let timeout = tokio::time::timeout(std::time::Duration::from_secs(15), rx.recv()).await;
        match timeout {
            Ok(Ok(agents)) => {
                let payload: Vec<AgentDto> = agents.into_iter().map(Into::into).collect();
                let json = serde_json::to_string(&payload).unwrap_or_default();
                Some((Ok(Event::default().data(json)), rx))
            }
            Ok(Err(broadcast::error::RecvError::Closed)) => None,
            // Every event is a full snapshot; a lagged receiver catches up
            // on the next one.
            Ok(Err(broadcast::error::RecvError::Lagged(_))) => {
                Some((Ok(Event::default().comment("lagged")), rx))
            }
            Err(_) => Some((Ok(Event::default().comment("heartbeat")), rx)),
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Static tool catalog
#[utoipa::path(
    get,
    path = "/api/v1/catalog/tools",
    tag = "catalog",
    responses(
        (status = 200, description = "Built-in tools and plugins", body = ToolsListResponse)
    )
)]
async fn list_tools() -> Json<ToolsListResponse> {
    Json(ToolsListResponse {
        tools: builtin_tools().into_iter().map(Into::into).collect(),
    })
}

// === Auth Handlers ===

/// Current user
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "auth",
    responses((status = 200, description = "Current user, if any", body = MeResponse))
)]
async fn auth_me(State(state): State<SharedState>) -> Json<MeResponse> {
    Json(MeResponse {
        user: state.identity.current_user().map(Into::into),
    })
}

/// Simulated sign-in
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    responses(
        (status = 200, description = "Signed in", body = MeResponse),
        (status = 502, description = "Identity provider failed", body = ApiResponse)
    )
)]
async fn auth_login(
    State(state): State<SharedState>,
) -> Result<Json<MeResponse>, (StatusCode, Json<ApiResponse>)> {
    let user = state
        .identity
        .sign_in()
        .map_err(|e| fail(StatusCode::BAD_GATEWAY, e.to_string()))?;
    Ok(Json(MeResponse {
        user: Some(user.into()),
    }))
}

/// Simulated sign-out
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    tag = "auth",
    responses((status = 200, description = "Signed out", body = ApiResponse))
)]
async fn auth_logout(State(state): State<SharedState>) -> Json<ApiResponse> {
    state.identity.sign_out();
    Json(ApiResponse {
        success: true,
        message: "Signed out".to_string(),
    })
}

// === Flow Handlers ===

/// Suggest a configuration and starter code for a new agent
#[utoipa::path(
    post,
    path = "/api/v1/flows/creation-assist",
    tag = "flows",
    responses(
        (status = 200, description = "Configuration, snippet, and explanation"),
        (status = 422, description = "Invalid request", body = ApiResponse),
        (status = 502, description = "Model call failed", body = ApiResponse)
    )
)]
async fn creation_assist(
    State(state): State<SharedState>,
    Json(req): Json<flows::CreationAssistRequest>,
) -> Result<Json<flows::CreationAssistResponse>, (StatusCode, Json<ApiResponse>)> {
    let client = chat_client(&state)?;
    let prompt = prompt_or_default(&state, "creation_assistant", prompts::CREATION_ASSISTANT);
    flows::creation::run_with_prompt(&client, &prompt, &req)
        .await
        .map(Json)
        .map_err(flow_error)
}

/// Suggest connection points and glue code for two agents
#[utoipa::path(
    post,
    path = "/api/v1/flows/linking-assist",
    tag = "flows",
    responses(
        (status = 200, description = "Connection points, validation, and glue code"),
        (status = 502, description = "Model call failed", body = ApiResponse)
    )
)]
async fn linking_assist(
    State(state): State<SharedState>,
    Json(req): Json<flows::LinkingAssistRequest>,
) -> Result<Json<flows::LinkingAssistResponse>, (StatusCode, Json<ApiResponse>)> {
    let client = chat_client(&state)?;
    let prompt = prompt_or_default(&state, "linking_assistant", prompts::LINKING_ASSISTANT);
    flows::linking::run_with_prompt(&client, &prompt, &req)
        .await
        .map(Json)
        .map_err(flow_error)
}

/// Assess an agent's security; marks the entry as scanned when it exists
#[utoipa::path(
    post,
    path = "/api/v1/flows/security-assessment",
    tag = "flows",
    request_body = SecurityAssessApiRequest,
    responses(
        (status = 200, description = "Verdict, summary, and findings"),
        (status = 502, description = "Model call failed", body = ApiResponse)
    )
)]
async fn security_assess(
    State(state): State<SharedState>,
    Json(req): Json<SecurityAssessApiRequest>,
) -> Result<Json<flows::SecurityAssessResponse>, (StatusCode, Json<ApiResponse>)> {
    let client = chat_client(&state)?;
    let prompt = prompt_or_default(&state, "security_auditor", prompts::SECURITY_AUDITOR);
    let flow_req = flows::SecurityAssessRequest {
        agent_description: req.agent_description,
        agent_code: req.agent_code,
    };
    let report = flows::security::run_with_prompt(&client, &prompt, &flow_req)
        .await
        .map_err(flow_error)?;

    // An assessed user entry earns the "scanned" rating.
    if let Some(agent_id) = req.agent_id {
        let is_user_created = state
            .store
            .get(&agent_id)
            .map(|agent| agent.is_user_created)
            .unwrap_or(false);
        if is_user_created {
            let patch = AgentPatch {
                security_rating: Some(report.overall_rating.catalog_rating()),
                ..Default::default()
            };
            if let Err(e) = state.store.update(&agent_id, &patch).await {
                eprintln!("Failed to record assessment for '{agent_id}': {e}");
            }
        }
    }

    Ok(Json(report))
}

/// Suggest a marketplace price for an agent
#[utoipa::path(
    post,
    path = "/api/v1/flows/price-suggestion",
    tag = "flows",
    responses(
        (status = 200, description = "Suggested price and justification"),
        (status = 502, description = "Model call failed", body = ApiResponse)
    )
)]
async fn price_suggestion(
    State(state): State<SharedState>,
    Json(req): Json<flows::PriceSuggestionRequest>,
) -> Result<Json<flows::PriceSuggestionResponse>, (StatusCode, Json<ApiResponse>)> {
    let client = chat_client(&state)?;
    let prompt = prompt_or_default(&state, "price_advisor", prompts::PRICE_ADVISOR);
    flows::pricing::run_with_prompt(&client, &prompt, &req)
        .await
        .map(Json)
        .map_err(flow_error)
}

/// Suggest name, description, and code for a new tool
#[utoipa::path(
    post,
    path = "/api/v1/flows/tool-code",
    tag = "flows",
    responses(
        (status = 200, description = "Suggested name, description, and snippet"),
        (status = 502, description = "Model call failed", body = ApiResponse)
    )
)]
async fn tool_code_suggestion(
    State(state): State<SharedState>,
    Json(req): Json<flows::ToolCodeRequest>,
) -> Result<Json<flows::ToolCodeResponse>, (StatusCode, Json<ApiResponse>)> {
    let client = chat_client(&state)?;
    let prompt = prompt_or_default(&state, "tool_code", prompts::TOOL_CODE);
    flows::tool_code::run_with_prompt(&client, &prompt, &req)
        .await
        .map(Json)
        .map_err(flow_error)
}

/// Suggest catalog tools and plugins for an agent
#[utoipa::path(
    post,
    path = "/api/v1/flows/tool-suggestions",
    tag = "flows",
    responses(
        (status = 200, description = "Suggested tool and plugin names"),
        (status = 502, description = "Model call failed", body = ApiResponse)
    )
)]
async fn tool_suggestions(
    State(state): State<SharedState>,
    Json(req): Json<flows::ToolSuggestionRequest>,
) -> Result<Json<flows::ToolSuggestionResponse>, (StatusCode, Json<ApiResponse>)> {
    let client = chat_client(&state)?;
    let prompt = prompt_or_default(&state, "tool_suggestion", prompts::TOOL_SUGGESTION);
    flows::tool_suggestion::run_with_prompt(&client, &prompt, &req)
        .await
        .map(Json)
        .map_err(flow_error)
}

// === Config Handlers ===

/// Get available LLM providers
#[utoipa::path(
    get,
    path = "/api/v1/providers",
    tag = "config",
    responses(
        (status = 200, description = "List of supported LLM providers", body = ProvidersResponse)
    )
)]
async fn get_providers() -> Json<ProvidersResponse> {
    let providers = LlmProvider::all()
        .into_iter()
        .map(|provider| ProviderInfo {
            id: wire_name(&provider),
            name: provider.display_name().to_string(),
            default_model: provider.default_model().to_string(),
            supports_base_url: provider.supports_base_url(),
            env_var: provider.env_var().to_string(),
        })
        .collect();
    Json(ProvidersResponse { providers })
}

/// Save API keys to .asynaptix/.env
#[utoipa::path(
    post,
    path = "/api/v1/settings/api-keys",
    tag = "config",
    request_body = ApiKeysRequest,
    responses(
        (status = 200, description = "API keys saved", body = ApiResponse)
    )
)]
async fn save_api_keys(Json(req): Json<ApiKeysRequest>) -> Json<ApiResponse> {
    use std::fs;
    use std::path::Path;

    let state_dir = Path::new(".asynaptix");

    if let Err(e) = fs::create_dir_all(state_dir) {
        return Json(ApiResponse {
            success: false,
            message: format!("Failed to create .asynaptix directory: {e}"),
        });
    }

    // Never let the keys end up in version control
    let gitignore_path = state_dir.join(".gitignore");
    if !gitignore_path.exists() {
        let _ = fs::write(&gitignore_path, "# Never commit API keys\n.env\n*.env\n");
    }

    let mut env_content =
        String::from("# Asynaptix API Keys - DO NOT COMMIT\n# Generated by the settings page\n\n");
    let entries = [
        ("ANTHROPIC_API_KEY", &req.anthropic),
        ("OPENAI_API_KEY", &req.openai),
        ("GEMINI_API_KEY", &req.gemini),
        ("OPENROUTER_API_KEY", &req.openrouter),
        ("XAI_API_KEY", &req.grok),
        ("DEEPSEEK_API_KEY", &req.deepseek),
    ];
    for (var, key) in entries {
        if let Some(key) = key {
            if !key.is_empty() {
                env_content.push_str(&format!("{var}={key}\n"));
            }
        }
    }

    let env_path = state_dir.join(".env");
    match fs::write(&env_path, env_content) {
        Ok(_) => {
            // Load for the current process immediately
            let _ = dotenvy::from_path(&env_path);
            Json(ApiResponse {
                success: true,
                message: "API keys saved and loaded".to_string(),
            })
        }
        Err(e) => Json(ApiResponse {
            success: false,
            message: format!("Failed to write .env file: {e}"),
        }),
    }
}

// === Prompt Template Handlers ===

/// List prompt templates
#[utoipa::path(
    get,
    path = "/api/v1/prompts",
    tag = "prompts",
    responses(
        (status = 200, description = "All prompt slugs with versions", body = PromptListResponse)
    )
)]
async fn list_prompts(
    State(state): State<SharedState>,
) -> Result<Json<PromptListResponse>, (StatusCode, Json<ApiResponse>)> {
    let prompts = state
        .db
        .list_prompts()
        .map_err(|e| fail(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(PromptListResponse {
        prompts: prompts
            .into_iter()
            .map(|(slug, version)| PromptListItem { slug, version })
            .collect(),
    }))
}

/// Get one prompt template
#[utoipa::path(
    get,
    path = "/api/v1/prompts/{slug}",
    tag = "prompts",
    params(("slug" = String, Path, description = "Prompt slug")),
    responses(
        (status = 200, description = "The prompt", body = PromptResponse),
        (status = 404, description = "Unknown slug", body = ApiResponse)
    )
)]
async fn get_prompt(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
) -> Result<Json<PromptResponse>, (StatusCode, Json<ApiResponse>)> {
    let (content, version) = state
        .db
        .get_prompt_versioned(&slug)
        .map_err(|e| fail(StatusCode::NOT_FOUND, e.to_string()))?;
    Ok(Json(PromptResponse {
        slug,
        version,
        content,
    }))
}

/// Update a prompt template (version increments)
#[utoipa::path(
    put,
    path = "/api/v1/prompts/{slug}",
    tag = "prompts",
    params(("slug" = String, Path, description = "Prompt slug")),
    request_body = UpdatePromptRequest,
    responses(
        (status = 200, description = "Prompt updated", body = UpdatePromptResponse)
    )
)]
async fn update_prompt(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
    Json(req): Json<UpdatePromptRequest>,
) -> Result<Json<UpdatePromptResponse>, (StatusCode, Json<ApiResponse>)> {
    let new_version = state
        .db
        .set_prompt(&slug, &req.content)
        .map_err(|e| fail(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(UpdatePromptResponse {
        success: true,
        slug,
        new_version,
    }))
}

// === OpenAPI ===

async fn serve_openapi() -> Response {
    let spec = ApiDoc::openapi().to_json().unwrap_or_default();
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        spec,
    )
        .into_response()
}

// === Server Setup ===

async fn run_server() -> anyhow::Result<()> {
    // Load API keys persisted by the settings endpoint, then any local .env
    let _ = dotenvy::from_path(".asynaptix/.env");
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let (server_port, db_path, provider, model) = match args.command {
        Some(CliCommand::Serve {
            port,
            db,
            provider,
            model,
        }) => (port, db, provider, model),
        None => (8080, None, "anthropic".to_string(), None),
    };

    let provider: LlmProvider =
        serde_json::from_value(serde_json::Value::String(provider.clone()))
            .unwrap_or_else(|_| {
                eprintln!("Unknown provider '{provider}', falling back to anthropic");
                LlmProvider::Anthropic
            });
    let model = ModelConfig::with_provider(
        provider,
        model.unwrap_or_else(|| provider.default_model().to_string()),
    );

    let db = Arc::new(match &db_path {
        Some(path) => AsynaptixDb::open_at(path)?,
        None => AsynaptixDb::open()?,
    });

    // Seed default prompts on first run
    match db.seed_prompts() {
        Ok(count) if count > 0 => println!("Seeded {count} default prompts"),
        Ok(_) => {}
        Err(e) => eprintln!("Failed to seed prompts: {e}"),
    }

    // Catalog store over the SQLite-backed collection
    let collection = Arc::new(SqliteCollection::new(Arc::clone(&db)));
    let store = CatalogStore::new(collection, seed_agents());
    store.initialize();

    let (catalog_tx, _) = broadcast::channel(64);
    let events_tx = catalog_tx.clone();
    let catalog_watch = store.subscribe_changes(move |agents| {
        let _ = events_tx.send(agents.to_vec());
    });

    let state: SharedState = Arc::new(AppState {
        store,
        identity: Arc::new(MockIdentity::signed_in()),
        db,
        model,
        catalog_tx,
        _catalog_watch: catalog_watch,
    });

    let catalog_routes = Router::new()
        .route("/agents", get(list_agents).post(upload_agent))
        .route("/agents/events", get(catalog_events))
        .route("/agents/:id", get(get_agent).patch(update_agent))
        .route("/tools", get(list_tools));

    let auth_routes = Router::new()
        .route("/me", get(auth_me))
        .route("/login", post(auth_login))
        .route("/logout", post(auth_logout));

    let flow_routes = Router::new()
        .route("/creation-assist", post(creation_assist))
        .route("/linking-assist", post(linking_assist))
        .route("/security-assessment", post(security_assess))
        .route("/price-suggestion", post(price_suggestion))
        .route("/tool-code", post(tool_code_suggestion))
        .route("/tool-suggestions", post(tool_suggestions));

    let prompt_routes = Router::new()
        .route("/", get(list_prompts))
        .route("/:slug", get(get_prompt).put(update_prompt));

    let settings_routes = Router::new().route("/api-keys", post(save_api_keys));

    let app = Router::new()
        .nest("/api/v1/catalog", catalog_routes)
        .nest("/api/v1/auth", auth_routes)
        .nest("/api/v1/flows", flow_routes)
        .nest("/api/v1/prompts", prompt_routes)
        .nest("/api/v1/settings", settings_routes)
        .route("/api/v1/providers", get(get_providers))
        .route("/api/v1/openapi.json", get(serve_openapi))
        .with_state(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], server_port));
    println!("Asynaptix Server running at http://{addr}");
    println!("   API v1 Routes:");
    println!("   Catalog:   /api/v1/catalog/agents, /agents/events, /tools");
    println!("   Flows:     /api/v1/flows/creation-assist, /security-assessment, ...");
    println!("   Auth:      /api/v1/auth/me, /login, /logout");
    println!("   Prompts:   /api/v1/prompts (GET, PUT)");
    println!("   Config:    /api/v1/providers, /api/v1/settings/api-keys");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("==========================================");
    println!("           ASYNAPTIX SERVER               ");
    println!("==========================================");

    run_server().await
}
