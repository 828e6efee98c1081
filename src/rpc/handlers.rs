use super::types::*;
use crate::account::types::*;
use crate::account::AccountService;
use crate::error::{ServiceError, ServiceResult};
use crate::rpc::RpcState;
use axum::{debug_handler, extract::State, Json};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error};

/// Main dispatcher: routes incoming JSON-RPC requests to the account operation.
#[debug_handler]
pub async fn handle_rpc_request(
    State(state): State<RpcState>,
    Json(req): Json<RpcRequest>,
) -> Json<RpcResponse> {
    debug!("RPC Request: method={}, id={}", req.method, req.id);

    let result = match req.method.as_str() {
        "User.Create" => call(state, req.params, |s, a: &CreateArgs| s.create(a)).await,
        "User.Destroy" => call(state, req.params, |s, a: &DestroyArgs| s.destroy(a)).await,
        "User.Query" => call(state, req.params, |s, a: &QueryArgs| s.query(a)).await,
        "User.QueryByEmail" => {
            call(state, req.params, |s, a: &QueryByEmailArgs| s.query_by_email(a)).await
        }
        "User.Login" => call(state, req.params, |s, a: &LoginArgs| s.login(a)).await,
        "User.LoginByEmail" => {
            call(state, req.params, |s, a: &LoginByEmailArgs| s.login_by_email(a)).await
        }
        "User.UpdateName" => call(state, req.params, |s, a: &UpdateNameArgs| s.update_name(a)).await,
        "User.UpdatePassword" => {
            call(state, req.params, |s, a: &UpdatePasswordArgs| s.update_password(a)).await
        }
        _ => Err(RpcError {
            code: METHOD_NOT_FOUND,
            message: format!("Method not found: {}", req.method),
        }),
    };

    Json(RpcResponse::from_result(req.id, result))
}

//
// === Helper Functions ===
//

/// Decode params, run the operation on a blocking worker and encode the reply.
/// The collection API is synchronous, so it must stay off the async executor.
async fn call<A, R, F>(state: RpcState, params: serde_json::Value, op: F) -> Result<serde_json::Value, RpcError>
where
    A: DeserializeOwned + Send + 'static,
    R: Serialize + Send + 'static,
    F: for<'s> FnOnce(&AccountService<'s>, &A) -> ServiceResult<R> + Send + 'static,
{
    let args: A = parse_params(params)?;

    let reply = tokio::task::spawn_blocking(move || {
        let service = AccountService::new(state.store.as_ref(), &state.hasher, &state.auth);
        op(&service, &args)
    })
    .await
    .map_err(|e| {
        error!("Account worker failed: {}", e);
        RpcError {
            code: INTERNAL_ERROR,
            message: "Internal error: worker failed".to_string(),
        }
    })?
    .map_err(to_rpc_error)?;

    to_json(&reply)
}

fn parse_params<A: DeserializeOwned>(params: serde_json::Value) -> Result<A, RpcError> {
    serde_json::from_value(params).map_err(|e| RpcError {
        code: INVALID_PARAMS,
        message: format!("Invalid params: {}", e),
    })
}

/// Safely serialize to JSON value
fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value, RpcError> {
    serde_json::to_value(value).map_err(|e| RpcError {
        code: INTERNAL_ERROR,
        message: format!("Serialization error: {}", e),
    })
}

fn to_rpc_error(err: ServiceError) -> RpcError {
    let code = match &err {
        ServiceError::NotFound => NOT_FOUND,
        ServiceError::DuplicateKey(_) => DUPLICATE_KEY,
        ServiceError::Unauthorized => UNAUTHORIZED,
        ServiceError::BackendUnavailable(_) => BACKEND_UNAVAILABLE,
        ServiceError::InvalidArgument(_) => INVALID_PARAMS,
        ServiceError::Credential(_) => INTERNAL_ERROR,
    };

    RpcError {
        code,
        message: err.to_string(),
    }
}
