use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use contracts::{
    api::{BalanceResponse, ContractInfo},
    ContractName, Identity, Revert,
};
use faucet::{ClaimantStatus, FaucetStatus};
use token::TokenInfo;

use crate::app::{AppError, RouterCtx};

/// Read-only contract routes.
pub(crate) fn router() -> Router<RouterCtx> {
    Router::new()
        .route("/v1/contract/{name}", get(get_contract))
        .route("/v1/contract/{name}/token", get(get_token))
        .route("/v1/contract/{name}/balance/{account}", get(get_balance))
        .route("/v1/contract/{name}/faucet", get(get_faucet))
        .route("/v1/contract/{name}/claimant/{account}", get(get_claimant))
}

fn not_found(revert: Revert) -> AppError {
    AppError(StatusCode::NOT_FOUND, revert)
}

async fn get_contract(
    Path(name): Path<String>,
    State(ctx): State<RouterCtx>,
) -> Result<Json<ContractInfo>, AppError> {
    let name = ContractName::from(name);
    ctx.node
        .read(|state, _| {
            state.contract(&name).map(|program| ContractInfo {
                name: name.clone(),
                program: program.kind(),
                state_commitment: hex::encode(program.commit().0),
            })
        })
        .await
        .map(Json)
        .map_err(not_found)
}

async fn get_token(
    Path(name): Path<String>,
    State(ctx): State<RouterCtx>,
) -> Result<Json<TokenInfo>, AppError> {
    let name = ContractName::from(name);
    ctx.node
        .read(|state, _| state.token(&name).map(|token| token.info()))
        .await
        .map(Json)
        .map_err(not_found)
}

async fn get_balance(
    Path((name, account)): Path<(String, String)>,
    State(ctx): State<RouterCtx>,
) -> Result<Json<BalanceResponse>, AppError> {
    let name = ContractName::from(name);
    let account = Identity::from(account).normalized();
    ctx.node
        .read(|state, _| {
            state.token(&name).map(|token| BalanceResponse {
                balance: token.balance_of(&account),
                account: account.clone(),
            })
        })
        .await
        .map(Json)
        .map_err(not_found)
}

async fn get_faucet(
    Path(name): Path<String>,
    State(ctx): State<RouterCtx>,
) -> Result<Json<FaucetStatus>, AppError> {
    let name = ContractName::from(name);
    ctx.node
        .read(|state, _| state.faucet(&name).map(|faucet| faucet.status()))
        .await
        .map(Json)
        .map_err(not_found)
}

async fn get_claimant(
    Path((name, account)): Path<(String, String)>,
    State(ctx): State<RouterCtx>,
) -> Result<Json<ClaimantStatus>, AppError> {
    let name = ContractName::from(name);
    let account = Identity::from(account).normalized();
    ctx.node
        .read(|state, now| state.faucet(&name).map(|faucet| faucet.claimant(&account, now)))
        .await
        .map(Json)
        .map_err(not_found)
}
