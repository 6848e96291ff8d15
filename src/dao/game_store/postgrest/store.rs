use std::{sync::Arc, time::SystemTime};

use futures::future::BoxFuture;
use reqwest::{
    Client, Method, RequestBuilder, Response,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use serde::Serialize;
use uuid::Uuid;

use crate::dao::{
    game_store::{GameReader, GameStore},
    models::{GameEntity, MoveWrite, Seat},
    storage::StorageResult,
};

use super::{
    config::PostgrestConfig,
    error::{PostgrestDaoError, PostgrestResult},
    models::{GameRow, MovePatch, SeatPatch, seat_column},
};

const RETURN_REPRESENTATION: (&str, &str) = ("Prefer", "return=representation");

/// Game store talking to one PostgREST table with one credential.
#[derive(Clone)]
pub struct PostgrestGameStore {
    client: Client,
    table_url: Arc<str>,
    table: Arc<str>,
}

impl PostgrestGameStore {
    /// Build the client for one credential scope and check that the table answers.
    pub async fn connect(config: PostgrestConfig) -> PostgrestResult<Self> {
        let key = config.api_key.expose();
        let mut headers = HeaderMap::new();
        let mut apikey =
            HeaderValue::from_str(key).map_err(|_| PostgrestDaoError::InvalidApiKey)?;
        apikey.set_sensitive(true);
        let mut bearer = HeaderValue::from_str(&format!("Bearer {key}"))
            .map_err(|_| PostgrestDaoError::InvalidApiKey)?;
        bearer.set_sensitive(true);
        headers.insert("apikey", apikey);
        headers.insert(AUTHORIZATION, bearer);

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|source| PostgrestDaoError::ClientBuilder { source })?;

        let store = Self {
            client,
            table_url: Arc::from(config.table_url()),
            table: Arc::from(config.table),
        };

        store.ping().await?;
        Ok(store)
    }

    fn request(&self, method: Method) -> RequestBuilder {
        self.client.request(method, self.table_url.as_ref())
    }

    async fn send(&self, builder: RequestBuilder) -> PostgrestResult<Response> {
        let response = builder
            .send()
            .await
            .map_err(|source| PostgrestDaoError::RequestSend {
                table: self.table.to_string(),
                source,
            })?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(PostgrestDaoError::RequestStatus {
                table: self.table.to_string(),
                status: response.status(),
            })
        }
    }

    /// Decode a response expected to hold zero or one row.
    async fn single_row(&self, response: Response) -> PostgrestResult<Option<GameEntity>> {
        let mut rows = response.json::<Vec<GameRow>>().await.map_err(|source| {
            PostgrestDaoError::DecodeResponse {
                table: self.table.to_string(),
                source,
            }
        })?;

        match rows.len() {
            0 => Ok(None),
            1 => Ok(rows.pop().map(GameRow::into_entity)),
            count => Err(PostgrestDaoError::UnexpectedRows {
                table: self.table.to_string(),
                count,
            }),
        }
    }

    async fn ping(&self) -> PostgrestResult<()> {
        let query = [("select", "id"), ("limit", "1")];
        self.send(self.request(Method::GET).query(&query)).await?;
        Ok(())
    }

    async fn select_by_id(&self, id: Uuid) -> PostgrestResult<Option<GameEntity>> {
        let query = [("select", "*".to_string()), ("id", format!("eq.{id}"))];
        let response = self.send(self.request(Method::GET).query(&query)).await?;
        self.single_row(response).await
    }

    async fn insert_defaults(&self) -> PostgrestResult<GameEntity> {
        // An empty object lets the database fill every column default.
        let builder = self
            .request(Method::POST)
            .header(RETURN_REPRESENTATION.0, RETURN_REPRESENTATION.1)
            .json(&serde_json::json!({}));
        let response = self.send(builder).await?;
        self.single_row(response)
            .await?
            .ok_or_else(|| PostgrestDaoError::UnexpectedRows {
                table: self.table.to_string(),
                count: 0,
            })
    }

    async fn patch_where<B>(
        &self,
        filters: &[(&str, String)],
        body: &B,
    ) -> PostgrestResult<Option<GameEntity>>
    where
        B: Serialize + ?Sized,
    {
        let builder = self
            .request(Method::PATCH)
            .query(filters)
            .header(RETURN_REPRESENTATION.0, RETURN_REPRESENTATION.1)
            .json(body);
        let response = self.send(builder).await?;
        self.single_row(response).await
    }
}

/// Filters of the move compare-and-set: same notation, game not complete.
fn move_guard(id: Uuid, expected_pgn: &str) -> Vec<(&'static str, String)> {
    let pgn = if expected_pgn.is_empty() {
        // `eq.` never matches a NULL column, and fresh rows may hold either.
        ("or", "(pgn.is.null,pgn.eq.)".to_string())
    } else {
        ("pgn", format!("eq.{expected_pgn}"))
    };
    vec![
        ("id", format!("eq.{id}")),
        pgn,
        ("status", "neq.complete".to_string()),
    ]
}

/// Filters of the seat claim: seat still empty, other seat not held by `player_id`.
fn seat_guard(id: Uuid, seat: Seat, player_id: &str) -> Vec<(&'static str, String)> {
    let other = seat_column(seat.other());
    vec![
        ("id", format!("eq.{id}")),
        (seat_column(seat), "is.null".to_string()),
        // `neq` alone would drop rows where the other seat is still null.
        (
            "or",
            format!(
                "({other}.is.null,{other}.neq.\"{player}\")",
                player = player_id.replace('"', "\\\""),
            ),
        ),
    ]
}

impl GameReader for PostgrestGameStore {
    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.select_by_id(id).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ping().await.map_err(Into::into) })
    }
}

impl GameStore for PostgrestGameStore {
    fn insert_game(&self) -> BoxFuture<'static, StorageResult<GameEntity>> {
        let store = self.clone();
        Box::pin(async move { store.insert_defaults().await.map_err(Into::into) })
    }

    fn apply_move(
        &self,
        id: Uuid,
        expected_pgn: String,
        write: MoveWrite,
    ) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let filters = move_guard(id, &expected_pgn);
            store
                .patch_where(&filters, &MovePatch::from(write))
                .await
                .map_err(Into::into)
        })
    }

    fn claim_seat(
        &self,
        id: Uuid,
        seat: Seat,
        player_id: String,
        at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let filters = seat_guard(id, seat, &player_id);
            store
                .patch_where(&filters, &SeatPatch::new(seat, player_id, at))
                .await
                .map_err(Into::into)
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ping().await.map_err(Into::into) })
    }
}
