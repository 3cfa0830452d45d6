//! API Handler for metacat
//!
//! Dispatches parsed requests to a shared `Catalog`. The catalog does
//! its own per-record locking, so requests are not serialized here.

use std::sync::Arc;

use serde_json::{json, Value};

use super::errors::{ApiError, ApiResult};
use super::request::{GetRequest, InsertRequest, Request, UpdateRequest};
use super::response::Response;
use crate::catalog::Catalog;
use crate::error::CatalogError;

/// JSON front end over a catalog
#[derive(Clone)]
pub struct ApiHandler {
    catalog: Arc<Catalog>,
}

impl ApiHandler {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Handle a raw JSON request string
    pub fn handle(&self, json_request: &str) -> Response {
        let result = Request::parse(json_request).and_then(|request| self.dispatch(request));
        match result {
            Ok(data) => Response::success(data),
            Err(e) => Response::error(&e),
        }
    }

    fn dispatch(&self, request: Request) -> ApiResult<Value> {
        match request {
            Request::Insert(r) => self.handle_insert(r),
            Request::Update(r) => self.handle_update(r),
            Request::Delete(id) => {
                let removed = self.catalog.delete(id)?;
                Ok(json!({"id": removed.id, "uuid": removed.uuid}))
            }
            Request::Get(r) => self.handle_get(r),
            Request::Flush => {
                self.catalog.flush_index()?;
                Ok(Value::Null)
            }
            Request::Search(query) => {
                let hits = self.catalog.search(&query)?;
                Ok(to_value(&hits)?)
            }
            Request::SetSetting { key, value } => {
                self.catalog
                    .settings()
                    .set_value(&key, &value)
                    .map_err(CatalogError::from)?;
                Ok(self.catalog.settings().to_json())
            }
            Request::CanDelete(id) => {
                let verdict = self.catalog.can_delete(id)?;
                Ok(to_value(&verdict)?)
            }
        }
    }

    fn handle_insert(&self, req: InsertRequest) -> ApiResult<Value> {
        let handle = match req.content {
            Value::String(text) => self.catalog.insert_raw(&text, req.metadata)?,
            content => self.catalog.insert(content, req.metadata)?,
        };
        Ok(to_value(&handle)?)
    }

    fn handle_update(&self, req: UpdateRequest) -> ApiResult<Value> {
        let handle = self.catalog.update(req.id, req.content, req.options)?;
        Ok(to_value(&handle)?)
    }

    fn handle_get(&self, req: GetRequest) -> ApiResult<Value> {
        let record = match req {
            GetRequest::Id(id) => self
                .catalog
                .get(id)?
                .ok_or(CatalogError::NotFound(id))?,
            GetRequest::Uuid(uuid) => self
                .catalog
                .get_by_uuid(&uuid)?
                .ok_or_else(|| ApiError::uuid_not_found(&uuid))?,
        };
        Ok(to_value(&record)?)
    }
}

fn to_value<T: serde::Serialize>(value: &T) -> ApiResult<Value> {
    serde_json::to_value(value)
        .map_err(|e| ApiError::from(CatalogError::Internal(format!("serialization failed: {}", e))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CatalogConfig;

    fn handler() -> ApiHandler {
        ApiHandler::new(Arc::new(Catalog::new(&CatalogConfig::default())))
    }

    fn data(resp: Response) -> Value {
        match resp {
            Response::Success(s) => s.data,
            Response::Error(e) => panic!("unexpected error {} {}", e.code, e.message),
        }
    }

    fn error_code(resp: Response) -> String {
        match resp {
            Response::Error(e) => e.code,
            Response::Success(s) => panic!("unexpected success {}", s.data),
        }
    }

    #[test]
    fn test_insert_flush_search() {
        let api = handler();
        let inserted = data(api.handle(
            r#"{"op":"insert","type":"DOCUMENT","owner":1,"source_id":"s",
                "content":{"MD_Metadata":{"title":"Alpine lakes"}}}"#,
        ));
        let uuid = inserted["uuid"].as_str().unwrap().to_string();

        data(api.handle(r#"{"op":"flush"}"#));
        let hits = data(api.handle(
            r#"{"op":"search","query":{"type":"term","field":"any","value":"lakes"}}"#,
        ));
        assert_eq!(hits[0]["uuid"], uuid);
    }

    #[test]
    fn test_insert_raw_text() {
        let api = handler();
        let inserted = data(api.handle(
            r#"{"op":"insert","type":"DOCUMENT","owner":1,"source_id":"s",
                "content":"{\"MD_Metadata\":{\"title\":\"raw\"}}"}"#,
        ));
        let got = data(api.handle(&format!(r#"{{"op":"get","id":{}}}"#, inserted["id"])));
        assert_eq!(got["root"], "MD_Metadata");

        let code = error_code(api.handle(
            r#"{"op":"insert","type":"DOCUMENT","owner":1,"source_id":"s","content":"<x/>"}"#,
        ));
        assert_eq!(code, "METACAT_VALIDATION_FAILED");
    }

    #[test]
    fn test_get_unknown() {
        let api = handler();
        assert_eq!(
            error_code(api.handle(r#"{"op":"get","id":99}"#)),
            "METACAT_RECORD_NOT_FOUND"
        );
        assert_eq!(
            error_code(api.handle(r#"{"op":"get","uuid":"missing"}"#)),
            "METACAT_RECORD_NOT_FOUND"
        );
    }

    #[test]
    fn test_set_setting() {
        let api = handler();
        let settings = data(api.handle(
            r#"{"op":"set_setting","key":"allow_referenced_deletion","value":true}"#,
        ));
        assert_eq!(settings["allow_referenced_deletion"], true);
        assert!(api.catalog().settings().allow_referenced_deletion());

        assert_eq!(
            error_code(api.handle(r#"{"op":"set_setting","key":"nope","value":1}"#)),
            "METACAT_UNKNOWN_SETTING"
        );
    }

    #[test]
    fn test_can_delete_and_delete() {
        let api = handler();
        let inserted = data(api.handle(
            r#"{"op":"insert","type":"SUB_TEMPLATE","owner":1,"source_id":"s",
                "content":{"CI_ResponsibleParty":{}}}"#,
        ));
        let id = inserted["id"].clone();

        let verdict = data(api.handle(&format!(r#"{{"op":"can_delete","id":{}}}"#, id)));
        assert_eq!(verdict["verdict"], "allowed");

        let removed = data(api.handle(&format!(r#"{{"op":"delete","id":{}}}"#, id)));
        assert_eq!(removed["uuid"], inserted["uuid"]);
    }
}
