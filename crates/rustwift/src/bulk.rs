//! Bulk middleware: archive extraction and multi-object deletion.
//!
//! Both operations answer with a JSON report (requested via
//! `Accept: application/json`) that is turned into a [`BulkError`] unless
//! every item succeeded.

use http::header::{ACCEPT, CONTENT_TYPE};
use http::{HeaderValue, Method, StatusCode};
use percent_encoding::utf8_percent_encode;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::request::{OBJECT_PATH, PATH_SEGMENT, Request, RequestOptions};
use crate::{Account, Body, BulkError, BulkObjectError, Container, Error, Object, Result};

/// Archive formats accepted by [`Account::bulk_upload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkUploadFormat {
    /// Plain tar.
    Tar,
    /// Gzip-compressed tar.
    TarGzip,
    /// Bzip2-compressed tar.
    TarBzip2,
}

impl BulkUploadFormat {
    /// Value of the `extract-archive` query parameter.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tar => "tar",
            Self::TarGzip => "tar.gz",
            Self::TarBzip2 => "tar.bz2",
        }
    }
}

/// Outcome of a successful [`Account::bulk_delete`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkDeleteReport {
    /// Items that were deleted.
    pub deleted: u64,
    /// Items that did not exist.
    pub not_found: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BulkResponse {
    #[serde(rename = "Response Status")]
    response_status: String,
    #[serde(rename = "Response Body")]
    response_body: String,
    #[serde(rename = "Errors")]
    errors: Vec<(String, String)>,
    #[serde(rename = "Number Files Created")]
    number_files_created: u64,
    #[serde(rename = "Number Deleted")]
    number_deleted: u64,
    #[serde(rename = "Number Not Found")]
    number_not_found: u64,
}

impl BulkResponse {
    /// The overall status; the leading integer of e.g. `"201 Created"`.
    fn status(&self) -> StatusCode {
        leading_status(&self.response_status)
    }

    fn object_errors(&self) -> Vec<BulkObjectError> {
        self.errors
            .iter()
            .map(|(name, status)| {
                let (container_name, object_name) = name
                    .trim_start_matches('/')
                    .split_once('/')
                    .map(|(c, o)| (c.to_owned(), o.to_owned()))
                    .unwrap_or_else(|| (name.trim_matches('/').to_owned(), String::new()));
                BulkObjectError {
                    container_name,
                    object_name,
                    status_code: leading_status(status),
                }
            })
            .collect()
    }
}

fn leading_status(raw: &str) -> StatusCode {
    raw.split_whitespace()
        .next()
        .and_then(|code| code.parse::<u16>().ok())
        .and_then(|code| StatusCode::from_u16(code).ok())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

fn is_success(status: StatusCode, overall_error: &str, errors: &[BulkObjectError]) -> bool {
    status.is_success() && overall_error.is_empty() && errors.is_empty()
}

impl Account {
    /// Upload an archive whose entries become objects.
    ///
    /// `upload_path` is where the archive is extracted: empty for the account
    /// root (top-level directories become containers), `container` or
    /// `container/prefix`. Returns the number of files created.
    pub async fn bulk_upload(
        &self,
        upload_path: &str,
        format: BulkUploadFormat,
        body: impl Into<Body>,
        opts: Option<&RequestOptions>,
    ) -> Result<u64> {
        let caps = self.capabilities().await?;
        if caps.bulk_upload.is_none() {
            return Err(Error::NotSupported);
        }

        let path = upload_path.trim_matches('/');
        let (container, object) = match path.split_once('/') {
            Some((c, o)) => (c, Some(o)),
            None => (path, None),
        };
        let mut req = Request::new(Method::PUT, &[StatusCode::OK])
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .value("extract-archive", format.as_str())
            .options(opts)?
            .body(body.into());
        if !container.is_empty() {
            req = req.container(container);
            if let Some(object) = object {
                req = req.object(object);
            }
        }

        let resp = req.send(self.backend().as_ref()).await?;
        let report: BulkResponse = serde_json::from_slice(&resp.into_body().collect().await?)?;
        let object_errors = report.object_errors();
        let status = report.status();
        debug!(
            upload_path,
            created = report.number_files_created,
            failed = object_errors.len(),
            "bulk upload finished"
        );
        if is_success(status, &report.response_body, &object_errors) {
            return Ok(report.number_files_created);
        }
        Err(BulkError {
            status_code: status,
            overall_error: report.response_body,
            object_errors,
            succeeded: report.number_files_created,
        }
        .into())
    }

    /// Delete many objects and containers.
    ///
    /// Objects are deleted before containers, so a container emptied by the
    /// same call can be removed. Without the bulk delete middleware each item
    /// is deleted by its own request. Items that do not exist count as
    /// `not_found`, not as errors.
    pub async fn bulk_delete(
        &self,
        objects: &[Object],
        containers: &[Container],
        opts: Option<&RequestOptions>,
    ) -> Result<BulkDeleteReport> {
        if objects.iter().any(|o| o.account() != self)
            || containers.iter().any(|c| c.account() != self)
        {
            return Err(Error::AccountMismatch);
        }
        if objects.is_empty() && containers.is_empty() {
            return Ok(BulkDeleteReport::default());
        }

        let caps = self.capabilities().await?;
        match caps.bulk_delete {
            Some(bulk) => {
                let paths: Vec<String> = objects
                    .iter()
                    .map(|o| {
                        format!(
                            "/{}/{}",
                            utf8_percent_encode(o.container().name(), PATH_SEGMENT),
                            utf8_percent_encode(o.name(), OBJECT_PATH)
                        )
                    })
                    .chain(
                        containers
                            .iter()
                            .map(|c| format!("/{}", utf8_percent_encode(c.name(), PATH_SEGMENT))),
                    )
                    .collect();
                let batch = usize::try_from(bulk.max_deletes_per_request.max(1)).unwrap_or(usize::MAX);
                self.bulk_delete_batched(&paths, batch, opts).await
            }
            None => self.bulk_delete_one_by_one(objects, containers, opts).await,
        }
    }

    async fn bulk_delete_batched(
        &self,
        paths: &[String],
        batch: usize,
        opts: Option<&RequestOptions>,
    ) -> Result<BulkDeleteReport> {
        let mut report = BulkDeleteReport::default();
        let mut object_errors = Vec::new();
        let mut failure: Option<(StatusCode, String)> = None;

        for chunk in paths.chunks(batch) {
            let mut body = chunk.join("\n");
            body.push('\n');
            let resp = Request::new(Method::DELETE, &[StatusCode::OK])
                .header(ACCEPT, HeaderValue::from_static("application/json"))
                .header(CONTENT_TYPE, HeaderValue::from_static("text/plain"))
                .value("bulk-delete", "")
                .options(opts)?
                .body(Body::from(body))
                .send(self.backend().as_ref())
                .await?;
            let resp: BulkResponse = serde_json::from_slice(&resp.into_body().collect().await?)?;
            report.deleted += resp.number_deleted;
            report.not_found += resp.number_not_found;

            let errors = resp.object_errors();
            let status = resp.status();
            if !is_success(status, &resp.response_body, &errors) {
                warn!(status = %status, failed = errors.len(), "bulk delete batch failed");
                if failure.is_none() || !resp.response_body.is_empty() {
                    failure = Some((status, resp.response_body));
                }
            }
            object_errors.extend(errors);
        }

        debug!(
            deleted = report.deleted,
            not_found = report.not_found,
            failed = object_errors.len(),
            "bulk delete finished"
        );
        match failure {
            None => Ok(report),
            Some((status_code, overall_error)) => Err(BulkError {
                status_code,
                overall_error,
                object_errors,
                succeeded: report.deleted,
            }
            .into()),
        }
    }

    async fn bulk_delete_one_by_one(
        &self,
        objects: &[Object],
        containers: &[Container],
        opts: Option<&RequestOptions>,
    ) -> Result<BulkDeleteReport> {
        let mut report = BulkDeleteReport::default();
        let mut object_errors = Vec::new();

        let targets = objects
            .iter()
            .map(|o| (o.container().name(), Some(o.name())))
            .chain(containers.iter().map(|c| (c.name(), None)));
        for (container, object) in targets {
            let mut req = Request::new(Method::DELETE, &[StatusCode::NO_CONTENT]).container(container);
            if let Some(object) = object {
                req = req.object(object);
            }
            match req.options(opts)?.send(self.backend().as_ref()).await {
                Ok(_) => report.deleted += 1,
                Err(e) if e.is_status(StatusCode::NOT_FOUND) => report.not_found += 1,
                Err(Error::UnexpectedStatus { status, .. }) => object_errors.push(BulkObjectError {
                    container_name: container.to_owned(),
                    object_name: object.unwrap_or_default().to_owned(),
                    status_code: status,
                }),
                Err(e) => return Err(e),
            }
        }

        if object_errors.is_empty() {
            return Ok(report);
        }
        Err(BulkError {
            status_code: StatusCode::BAD_REQUEST,
            overall_error: String::new(),
            object_errors,
            succeeded: report.deleted,
        }
        .into())
    }
}
