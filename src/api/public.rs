//! Read-only endpoints backing the public pages.

use axum::extract::{Path, Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures::{Stream, StreamExt};
use serde::Deserialize;

use crate::api::errors::GENERIC_FAILURE_MESSAGE;
use crate::app::AppState;
use crate::db::live::LiveQuery;
use crate::db::models::{CollectionKind, ContentRecord, ListQuery, OrderField, RecordOrder, SortDirection};
use crate::error::AppError;

/// Query parameters for list and live endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub order: Option<OrderField>,
    pub direction: Option<SortDirection>,
    pub limit: Option<usize>,
}

impl ListParams {
    pub fn into_query(self, kind: CollectionKind) -> Result<ListQuery, AppError> {
        if self.limit == Some(0) {
            return Err(AppError::BadRequest("limit must be at least 1".into()));
        }

        let default = kind.default_order();
        let order = match self.order {
            Some(field) => RecordOrder {
                field,
                direction: self.direction.unwrap_or_default(),
            },
            None => RecordOrder {
                field: default.field,
                direction: self.direction.unwrap_or(default.direction),
            },
        };
        Ok(ListQuery {
            order,
            limit: self.limit,
        })
    }
}

pub(crate) fn parse_collection(segment: &str) -> Result<CollectionKind, AppError> {
    CollectionKind::from_str_ci(segment).ok_or_else(|| {
        AppError::NotFound(format!(
            "Unknown collection '{segment}'. Expected: articles, projects, events, courses"
        ))
    })
}

/// `GET /api/v1/{collection}`
pub async fn list_handler(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<ContentRecord>>, AppError> {
    let kind = parse_collection(&collection)?;
    let records = state.store.list(kind, &params.into_query(kind)?).await?;
    Ok(Json(records))
}

/// `GET /api/v1/{collection}/{id}`
pub async fn get_handler(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<Json<ContentRecord>, AppError> {
    let kind = parse_collection(&collection)?;
    let record = state.manager.find(kind, &id).await?;
    Ok(Json(record))
}

/// `GET /api/v1/{collection}/live`
///
/// Server-sent events: a `snapshot` event with the current list, then one
/// after every change to the collection. Disconnecting drops the
/// subscription.
pub async fn live_handler(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, AppError> {
    let kind = parse_collection(&collection)?;
    let subscription = LiveQuery::new(
        state.store.clone(),
        state.feed.clone(),
        kind,
        params.into_query(kind)?,
    )
    .start();

    let events = subscription.map(move |snapshot| match snapshot {
        Ok(records) => Event::default().event("snapshot").json_data(records),
        Err(e) => {
            tracing::error!("Live query on {} failed: {}", kind, e);
            Ok(Event::default().event("error").data(GENERIC_FAILURE_MESSAGE))
        }
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_follow_collection() {
        let query = ListParams::default().into_query(CollectionKind::Events).unwrap();
        assert_eq!(query.order.field, OrderField::PublishedAt);
        assert_eq!(query.order.direction, SortDirection::Desc);
        assert_eq!(query.limit, None);
    }

    #[test]
    fn test_explicit_params() {
        let params = ListParams {
            order: Some(OrderField::Title),
            direction: Some(SortDirection::Asc),
            limit: Some(3),
        };
        let query = params.into_query(CollectionKind::Articles).unwrap();
        assert_eq!(query.order.field, OrderField::Title);
        assert_eq!(query.order.direction, SortDirection::Asc);
        assert_eq!(query.limit, Some(3));
    }

    #[test]
    fn test_direction_only() {
        let params = ListParams {
            direction: Some(SortDirection::Asc),
            ..Default::default()
        };
        let query = params.into_query(CollectionKind::Courses).unwrap();
        assert_eq!(query.order.field, OrderField::CreatedAt);
        assert_eq!(query.order.direction, SortDirection::Asc);
    }

    #[test]
    fn test_zero_limit_is_rejected() {
        let params = ListParams {
            limit: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            params.into_query(CollectionKind::Articles),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_parse_collection() {
        assert_eq!(parse_collection("Projects").unwrap(), CollectionKind::Projects);
        assert!(matches!(parse_collection("services"), Err(AppError::NotFound(_))));
    }
}
