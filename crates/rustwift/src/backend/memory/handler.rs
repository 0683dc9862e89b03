//! Request routing and Swift semantics of the in-memory backend.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::request::Parts;
use http::{Method, Response, StatusCode};
use percent_encoding::percent_decode_str;
use rustwift_headers::Headers;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::trace;

use super::archive::{Compression, read_archive};
use super::state::{
    AccountState, ContainerState, ObjectKind, StoredObject, StoredSegment, SwiftStore,
    resolve_range,
};
use super::MemoryBackendConfig;
use crate::Body;
use crate::checksums::{compute_md5, compute_slo_etag};
use crate::large_object::SegmentRange;

const ACCOUNT_META: &str = "X-Account-Meta-";
const CONTAINER_META: &str = "X-Container-Meta-";
const OBJECT_META: &str = "X-Object-Meta-";

const CONTAINER_FIELDS: &[&str] = &[
    "X-Container-Read",
    "X-Container-Write",
    "X-Container-Sync-Key",
    "X-Container-Sync-To",
    "X-History-Location",
    "X-Versions-Location",
    "X-Storage-Policy",
];

const OBJECT_FIELDS: &[&str] = &[
    "Content-Type",
    "Content-Disposition",
    "Content-Encoding",
    "X-Delete-At",
    "X-Object-Manifest",
    "X-Symlink-Target",
];

/// A parsed request.
struct Call<'a> {
    method: &'a Method,
    headers: Headers,
    query: BTreeMap<String, String>,
    body: Bytes,
}

impl Call<'_> {
    fn has_query(&self, key: &str) -> bool {
        self.query.contains_key(key)
    }

    fn query(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }
}

/// Handle one request against `store`.
pub(super) fn handle(
    store: &SwiftStore,
    config: &MemoryBackendConfig,
    parts: &Parts,
    body: Bytes,
) -> Response<Body> {
    let call = Call {
        method: &parts.method,
        headers: Headers::from_header_map(&parts.headers),
        query: parts
            .uri
            .query()
            .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default(),
        body,
    };

    let path = parts.uri.path();
    trace!(method = %call.method, path, "memory backend request");
    if path == "/info" {
        return match *call.method {
            Method::GET | Method::HEAD => json_response(StatusCode::OK, &capabilities(config)),
            _ => status(StatusCode::METHOD_NOT_ALLOWED),
        };
    }

    let Some(rest) = path.strip_prefix("/v1/") else {
        return status(StatusCode::NOT_FOUND);
    };
    let (account, rest) = rest.split_once('/').unwrap_or((rest, ""));
    let account = decode(account);
    let (container, object) = match rest.split_once('/') {
        Some((c, o)) if !o.is_empty() => (decode(c), Some(decode(o))),
        Some((c, _)) => (decode(c), None),
        None => (decode(rest), None),
    };

    let (mut state, created) = store.account(&account);
    match (container.is_empty(), object) {
        (true, _) => account_request(&mut state, created, config, &call),
        (false, None) => container_request(&mut state, config, &container, &call),
        (false, Some(object)) => object_request(&mut state, config, &container, &object, &call),
    }
}

fn decode(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

fn capabilities(config: &MemoryBackendConfig) -> Value {
    let mut caps = json!({
        "swift": {
            "version": "memory",
            "max_file_size": 5_368_709_122_u64,
            "container_listing_limit": 10_000,
            "account_listing_limit": 10_000,
        }
    });
    if config.bulk_delete {
        caps["bulk_delete"] = json!({
            "max_deletes_per_request": config.max_deletes_per_request,
            "max_failed_deletes": 1000,
        });
    }
    if config.bulk_upload {
        caps["bulk_upload"] = json!({
            "max_containers_per_extraction": 10_000,
            "max_failed_extractions": 1000,
        });
    }
    if config.slo {
        caps["slo"] = json!({
            "max_manifest_segments": 1000,
            "max_manifest_size": 8_388_608,
            "min_segment_size": 1,
        });
    }
    if config.tempurl {
        caps["tempurl"] = json!({
            "methods": ["GET", "HEAD", "PUT", "POST", "DELETE"],
            "allowed_digests": ["sha1", "sha256", "sha512"],
        });
    }
    caps
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

fn respond(code: StatusCode, headers: &Headers, body: Body) -> Response<Body> {
    let mut resp = Response::new(body);
    *resp.status_mut() = code;
    *resp.headers_mut() = headers.to_header_map().unwrap_or_default();
    resp
}

fn status(code: StatusCode) -> Response<Body> {
    respond(code, &Headers::new(), Body::Empty)
}

fn text(code: StatusCode, message: &str) -> Response<Body> {
    let mut headers = Headers::new();
    headers.set("Content-Type", "text/plain; charset=utf-8");
    respond(code, &headers, Body::from(message.to_owned()))
}

fn json_response(code: StatusCode, value: &Value) -> Response<Body> {
    let mut headers = Headers::new();
    headers.set("Content-Type", "application/json; charset=utf-8");
    respond(code, &headers, Body::from(value.to_string()))
}

fn timestamp(t: DateTime<Utc>) -> String {
    format!("{}.{:05}", t.timestamp(), t.timestamp_subsec_micros() / 10)
}

fn listing_time(t: DateTime<Utc>) -> String {
    t.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// Apply an update request to stored headers: non-empty values are set,
/// empty values remove the key.
fn apply_update(target: &mut Headers, request: &Headers, writable: impl Fn(&str) -> bool) {
    for (key, value) in request {
        if !writable(key) {
            continue;
        }
        if value.is_empty() {
            target.del(key);
        } else {
            target.set(key, value);
        }
    }
}

fn is_container_field(key: &str) -> bool {
    key.starts_with(CONTAINER_META) || CONTAINER_FIELDS.contains(&key)
}

fn is_object_field(key: &str) -> bool {
    key.starts_with(OBJECT_META) || OBJECT_FIELDS.contains(&key)
}

/// Entries of a listing, after `prefix`, `marker`, `end_marker`, `delimiter`
/// and `limit` are applied. Rolled-up pseudo-directories are `Err(prefix)`.
fn select<'a, T>(
    items: impl Iterator<Item = (&'a str, T)>,
    call: &Call<'_>,
) -> Vec<Result<(&'a str, T), String>> {
    let prefix = call.query("prefix").unwrap_or_default();
    let marker = call.query("marker").unwrap_or_default();
    let end_marker = call.query("end_marker").unwrap_or_default();
    let delimiter = call.query("delimiter").unwrap_or_default();
    let limit = call
        .query("limit")
        .and_then(|l| l.parse::<usize>().ok())
        .unwrap_or(10_000);

    let mut out: Vec<Result<(&'a str, T), String>> = Vec::new();
    for (name, item) in items {
        if out.len() >= limit {
            break;
        }
        if !name.starts_with(prefix) || name <= marker {
            continue;
        }
        if !end_marker.is_empty() && name >= end_marker {
            break;
        }
        let rollup = if delimiter.is_empty() {
            None
        } else {
            name[prefix.len()..].find(delimiter)
        };
        if let Some(pos) = rollup {
            let dir = &name[..prefix.len() + pos + delimiter.len()];
            if dir > marker && !matches!(out.last(), Some(Err(last)) if last == dir) {
                out.push(Err(dir.to_owned()));
            }
            continue;
        }
        out.push(Ok((name, item)));
    }
    out
}

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

fn account_headers(account: &AccountState) -> Headers {
    let mut headers = account.headers.clone();
    headers.set("X-Account-Container-Count", account.containers.len().to_string());
    headers.set("X-Account-Object-Count", account.object_count().to_string());
    headers.set("X-Account-Bytes-Used", account.bytes_used().to_string());
    headers.set("X-Timestamp", timestamp(account.created_at));
    headers
}

fn account_request(
    account: &mut AccountState,
    created: bool,
    config: &MemoryBackendConfig,
    call: &Call<'_>,
) -> Response<Body> {
    match *call.method {
        Method::HEAD => respond(StatusCode::NO_CONTENT, &account_headers(account), Body::Empty),
        Method::GET => {
            let entries: Vec<Value> = select(
                account.containers.iter().map(|(name, c)| (name.as_str(), c)),
                call,
            )
            .into_iter()
            .map(|entry| match entry {
                Ok((name, c)) => json!({
                    "name": name,
                    "count": c.objects.len(),
                    "bytes": c.bytes_used(),
                    "last_modified": listing_time(c.last_modified()),
                }),
                Err(subdir) => json!({ "subdir": subdir }),
            })
            .collect();
            listing_response(&account_headers(account), entries)
        }
        Method::POST => {
            apply_update(&mut account.headers, &call.headers, |k| k.starts_with(ACCOUNT_META));
            status(StatusCode::NO_CONTENT)
        }
        Method::PUT if call.has_query("extract-archive") => {
            bulk_upload(account, config, "", "", call)
        }
        Method::PUT => {
            apply_update(&mut account.headers, &call.headers, |k| k.starts_with(ACCOUNT_META));
            status(if created { StatusCode::CREATED } else { StatusCode::ACCEPTED })
        }
        Method::DELETE if call.has_query("bulk-delete") => bulk_delete(account, config, call),
        Method::DELETE => status(StatusCode::FORBIDDEN),
        _ => status(StatusCode::METHOD_NOT_ALLOWED),
    }
}

fn listing_response(headers: &Headers, entries: Vec<Value>) -> Response<Body> {
    if entries.is_empty() {
        return respond(StatusCode::NO_CONTENT, headers, Body::Empty);
    }
    let mut headers = headers.clone();
    headers.set("Content-Type", "application/json; charset=utf-8");
    respond(StatusCode::OK, &headers, Body::from(Value::Array(entries).to_string()))
}

// ---------------------------------------------------------------------------
// Container
// ---------------------------------------------------------------------------

fn container_headers(container: &ContainerState) -> Headers {
    let mut headers = container.headers.clone();
    headers.set("X-Container-Object-Count", container.objects.len().to_string());
    headers.set("X-Container-Bytes-Used", container.bytes_used().to_string());
    headers.set("X-Timestamp", timestamp(container.created_at));
    headers
}

fn container_request(
    account: &mut AccountState,
    config: &MemoryBackendConfig,
    name: &str,
    call: &Call<'_>,
) -> Response<Body> {
    if name.contains('/') {
        return status(StatusCode::PRECONDITION_FAILED);
    }
    match *call.method {
        Method::PUT if call.has_query("extract-archive") => {
            bulk_upload(account, config, name, "", call)
        }
        Method::PUT => {
            let created = !account.containers.contains_key(name);
            let container = account
                .containers
                .entry(name.to_owned())
                .or_insert_with(ContainerState::new);
            apply_update(&mut container.headers, &call.headers, is_container_field);
            status(if created { StatusCode::CREATED } else { StatusCode::ACCEPTED })
        }
        _ => {
            let Some(container) = account.containers.get_mut(name) else {
                return status(StatusCode::NOT_FOUND);
            };
            match *call.method {
                Method::HEAD => {
                    respond(StatusCode::NO_CONTENT, &container_headers(container), Body::Empty)
                }
                Method::GET => {
                    let entries = select(
                        container.objects.iter().map(|(name, o)| (name.as_str(), o)),
                        call,
                    )
                    .into_iter()
                    .map(|entry| match entry {
                        Ok((name, o)) => json!({
                            "name": name,
                            "bytes": o.size,
                            "hash": o.etag.trim_matches('"'),
                            "content_type": o.headers.get("Content-Type").unwrap_or_default(),
                            "last_modified": listing_time(o.last_modified),
                        }),
                        Err(subdir) => json!({ "subdir": subdir }),
                    })
                    .collect();
                    listing_response(&container_headers(container), entries)
                }
                Method::POST => {
                    apply_update(&mut container.headers, &call.headers, is_container_field);
                    status(StatusCode::NO_CONTENT)
                }
                Method::DELETE => {
                    if !container.objects.is_empty() {
                        return text(
                            StatusCode::CONFLICT,
                            "There was a conflict when trying to complete your request.",
                        );
                    }
                    account.containers.remove(name);
                    status(StatusCode::NO_CONTENT)
                }
                _ => status(StatusCode::METHOD_NOT_ALLOWED),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Object
// ---------------------------------------------------------------------------

fn object_request(
    account: &mut AccountState,
    config: &MemoryBackendConfig,
    container: &str,
    name: &str,
    call: &Call<'_>,
) -> Response<Body> {
    if !account.containers.contains_key(container) {
        return status(StatusCode::NOT_FOUND);
    }
    match *call.method {
        Method::PUT if call.has_query("extract-archive") => {
            bulk_upload(account, config, container, name, call)
        }
        Method::PUT => put_object(account, config, container, name, call),
        Method::GET | Method::HEAD => get_object(account, container, name, call),
        Method::POST => {
            let Some(object) = account
                .containers
                .get_mut(container)
                .and_then(|c| c.objects.get_mut(name))
            else {
                return status(StatusCode::NOT_FOUND);
            };
            let mut headers = Headers::new();
            for key in ["Content-Type", "X-Object-Manifest"] {
                if let Some(value) = object.headers.get(key) {
                    headers.set(key, value);
                }
            }
            apply_update(&mut headers, &call.headers, is_object_field);
            object.headers = headers;
            if matches!(object.kind, ObjectKind::Plain | ObjectKind::Dynamic(_)) {
                object.kind = match object.headers.get("X-Object-Manifest") {
                    Some(manifest) => ObjectKind::Dynamic(manifest.to_owned()),
                    None => ObjectKind::Plain,
                };
            }
            status(StatusCode::ACCEPTED)
        }
        Method::DELETE => {
            let removed = account
                .containers
                .get_mut(container)
                .and_then(|c| c.objects.remove(name));
            match removed {
                Some(_) => status(StatusCode::NO_CONTENT),
                None => status(StatusCode::NOT_FOUND),
            }
        }
        _ => status(StatusCode::METHOD_NOT_ALLOWED),
    }
}

fn put_object(
    account: &mut AccountState,
    config: &MemoryBackendConfig,
    container: &str,
    name: &str,
    call: &Call<'_>,
) -> Response<Body> {
    let mut headers = Headers::new();
    apply_update(&mut headers, &call.headers, is_object_field);
    if !headers.contains("Content-Type") {
        headers.set("Content-Type", "application/octet-stream");
    }

    let object = if config.slo && call.query("multipart-manifest") == Some("put") {
        match store_slo(account, &call.body) {
            Ok((segments, size, etag)) => {
                headers.del("X-Object-Manifest");
                StoredObject {
                    data: call.body.clone(),
                    headers,
                    size,
                    etag,
                    last_modified: Utc::now(),
                    kind: ObjectKind::Static(segments),
                }
            }
            Err(message) => return text(StatusCode::BAD_REQUEST, &message),
        }
    } else {
        let etag = compute_md5(&call.body);
        let mismatch = call
            .headers
            .get("Etag")
            .is_some_and(|expected| !expected.trim_matches('"').eq_ignore_ascii_case(&etag));
        if mismatch {
            return status(StatusCode::UNPROCESSABLE_ENTITY);
        }
        let kind = match headers.get("X-Object-Manifest") {
            Some(manifest) => ObjectKind::Dynamic(manifest.to_owned()),
            None => ObjectKind::Plain,
        };
        StoredObject {
            size: call.body.len() as u64,
            data: call.body.clone(),
            headers,
            etag,
            last_modified: Utc::now(),
            kind,
        }
    };

    let mut resp_headers = Headers::new();
    if config.corrupt_put_etag {
        resp_headers.set("Etag", compute_md5(object.etag.as_bytes()));
    } else {
        resp_headers.set("Etag", object.etag.clone());
    }
    if let Some(c) = account.containers.get_mut(container) {
        c.objects.insert(name.to_owned(), object);
    }
    respond(StatusCode::CREATED, &resp_headers, Body::Empty)
}

#[derive(Debug, Deserialize)]
struct ManifestEntry {
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    size_bytes: Option<u64>,
    #[serde(default)]
    etag: Option<String>,
    #[serde(default)]
    range: Option<String>,
    #[serde(default)]
    data: Option<String>,
}

/// Validate an SLO manifest. Returns the segments, the total size and the
/// Etag of the assembled object, or the reason for rejecting it.
fn store_slo(
    account: &AccountState,
    body: &[u8],
) -> Result<(Vec<StoredSegment>, u64, String), String> {
    let entries: Vec<ManifestEntry> =
        serde_json::from_slice(body).map_err(|e| format!("Manifest must be valid JSON: {e}"))?;

    let mut segments = Vec::with_capacity(entries.len());
    let mut etags = Vec::with_capacity(entries.len());
    let mut total = 0u64;
    for (index, entry) in entries.into_iter().enumerate() {
        if let Some(data) = entry.data {
            let other_keys = entry.path.is_some()
                || entry.size_bytes.is_some()
                || entry.etag.is_some()
                || entry.range.is_some();
            if other_keys {
                return Err(format!("Index {index}: data segments may not have other keys"));
            }
            let data = STANDARD
                .decode(data)
                .map_err(|_| format!("Index {index}: data must be valid base64"))?;
            total += data.len() as u64;
            etags.push(compute_md5(&data));
            segments.push(StoredSegment::Data(Bytes::from(data)));
            continue;
        }

        let path = entry.path.unwrap_or_default();
        let (container, object) = path
            .strip_prefix('/')
            .and_then(|p| p.split_once('/'))
            .ok_or_else(|| format!("Index {index}: path does not refer to an object"))?;
        let stored = account
            .object(container, object)
            .ok_or_else(|| format!("{path}, 404 Not Found"))?;
        let content = account
            .content(container, object)
            .map_err(|code| format!("{path}, {code}"))?;

        if entry.size_bytes.is_some_and(|s| s != content.len() as u64) {
            return Err(format!("{path}, Size Mismatch"));
        }
        let etag = stored.etag.trim_matches('"').to_owned();
        if entry.etag.is_some_and(|e| !e.trim_matches('"').eq_ignore_ascii_case(&etag)) {
            return Err(format!("{path}, Etag Mismatch"));
        }
        let range = match entry.range.as_deref() {
            None | Some("") => SegmentRange::full(),
            Some(raw) => SegmentRange::parse(raw)
                .ok_or_else(|| format!("Index {index}: invalid range {raw}"))?,
        };
        let (start, end) = resolve_range(range, content.len())
            .ok_or_else(|| format!("Index {index}: unsatisfiable range"))?;

        total += (end - start) as u64;
        etags.push(etag.clone());
        segments.push(StoredSegment::Object {
            container: container.to_owned(),
            object: object.to_owned(),
            size_bytes: content.len() as u64,
            etag,
            range,
        });
    }
    let etag = compute_slo_etag(etags.iter().map(String::as_str));
    Ok((segments, total, etag))
}

fn raw_manifest(segments: &[StoredSegment]) -> Value {
    Value::Array(
        segments
            .iter()
            .map(|segment| match segment {
                StoredSegment::Data(data) => json!({ "data": STANDARD.encode(data) }),
                StoredSegment::Object {
                    container,
                    object,
                    size_bytes,
                    etag,
                    range,
                } => {
                    let mut entry = json!({
                        "path": format!("/{container}/{object}"),
                        "size_bytes": size_bytes,
                        "etag": etag,
                    });
                    if let Some(range) = range.to_manifest_value() {
                        entry["range"] = Value::String(range);
                    }
                    entry
                }
            })
            .collect(),
    )
}

fn get_object(
    account: &AccountState,
    container: &str,
    name: &str,
    call: &Call<'_>,
) -> Response<Body> {
    let Some(object) = account.object(container, name) else {
        return status(StatusCode::NOT_FOUND);
    };
    let mut headers = object.headers.clone();
    headers.set("X-Timestamp", timestamp(object.last_modified));
    headers.set("Last-Modified", object.last_modified.to_rfc2822());
    if let ObjectKind::Static(segments) = &object.kind {
        headers.set("X-Static-Large-Object", "True");
        if call.query("multipart-manifest") == Some("get") {
            let manifest = raw_manifest(segments).to_string();
            headers.set("Content-Type", "application/json; charset=utf-8");
            headers.set("Content-Length", manifest.len().to_string());
            headers.set("Etag", compute_md5(manifest.as_bytes()));
            let body = if *call.method == Method::GET { Body::from(manifest) } else { Body::Empty };
            return respond(StatusCode::OK, &headers, body);
        }
    }

    let (size, etag) = match account.size_and_etag(container, name) {
        Ok(pair) => pair,
        Err(code) => return status(code),
    };
    headers.set("Content-Length", size.to_string());
    headers.set("Etag", etag);
    if *call.method == Method::HEAD {
        return respond(StatusCode::OK, &headers, Body::Empty);
    }
    match account.content(container, name) {
        Ok(content) => respond(StatusCode::OK, &headers, Body::from(content)),
        Err(code) => status(code),
    }
}

// ---------------------------------------------------------------------------
// Bulk middleware
// ---------------------------------------------------------------------------

fn bulk_report(
    code: StatusCode,
    body: &str,
    errors: &[(String, StatusCode)],
    counters: &[(&str, u64)],
) -> Response<Body> {
    let mut report = json!({
        "Response Status": code.to_string(),
        "Response Body": body,
        "Errors": errors
            .iter()
            .map(|(name, code)| json!([name, code.to_string()]))
            .collect::<Vec<_>>(),
    });
    for (key, value) in counters {
        report[*key] = json!(value);
    }
    json_response(StatusCode::OK, &report)
}

fn bulk_delete(
    account: &mut AccountState,
    config: &MemoryBackendConfig,
    call: &Call<'_>,
) -> Response<Body> {
    if !config.bulk_delete {
        return status(StatusCode::FORBIDDEN);
    }
    let text_body = String::from_utf8_lossy(&call.body);
    let lines: Vec<String> = text_body
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(decode)
        .collect();
    if lines.len() as u64 > config.max_deletes_per_request {
        return bulk_report(
            StatusCode::PAYLOAD_TOO_LARGE,
            "Maximum Bulk Deletes exceeded",
            &[],
            &[("Number Deleted", 0), ("Number Not Found", 0)],
        );
    }

    let (mut deleted, mut not_found) = (0u64, 0u64);
    let mut errors = Vec::new();
    for line in lines {
        let path = line.trim_start_matches('/');
        let outcome = match path.split_once('/') {
            Some((container, object)) => account
                .containers
                .get_mut(container)
                .and_then(|c| c.objects.remove(object))
                .map_or(StatusCode::NOT_FOUND, |_| StatusCode::NO_CONTENT),
            None => match account.containers.get(path) {
                None => StatusCode::NOT_FOUND,
                Some(c) if !c.objects.is_empty() => StatusCode::CONFLICT,
                Some(_) => {
                    account.containers.remove(path);
                    StatusCode::NO_CONTENT
                }
            },
        };
        match outcome {
            StatusCode::NO_CONTENT => deleted += 1,
            StatusCode::NOT_FOUND => not_found += 1,
            code => errors.push((line.clone(), code)),
        }
    }

    let code = if errors.is_empty() { StatusCode::OK } else { StatusCode::BAD_REQUEST };
    bulk_report(
        code,
        "",
        &errors,
        &[("Number Deleted", deleted), ("Number Not Found", not_found)],
    )
}

fn bulk_upload(
    account: &mut AccountState,
    config: &MemoryBackendConfig,
    container: &str,
    prefix: &str,
    call: &Call<'_>,
) -> Response<Body> {
    if !config.bulk_upload {
        return status(StatusCode::BAD_REQUEST);
    }
    let created = [("Number Files Created", 0)];
    let Some(compression) = call.query("extract-archive").and_then(Compression::from_query) else {
        return bulk_report(
            StatusCode::BAD_REQUEST,
            "Invalid Tar File: unsupported compression",
            &[],
            &created,
        );
    };
    let entries = match read_archive(&call.body, compression) {
        Ok(entries) => entries,
        Err(e) => {
            let message = format!("Invalid Tar File: {e}");
            return bulk_report(StatusCode::BAD_REQUEST, &message, &[], &created);
        }
    };

    let mut count = 0u64;
    let mut errors = Vec::new();
    for entry in entries {
        let full = if container.is_empty() {
            entry.path.trim_start_matches('/').to_owned()
        } else if prefix.is_empty() {
            format!("{container}/{}", entry.path.trim_start_matches('/'))
        } else {
            format!("{container}/{prefix}/{}", entry.path.trim_start_matches('/'))
        };
        let Some((c, o)) = full.split_once('/').filter(|(c, o)| !c.is_empty() && !o.is_empty())
        else {
            errors.push((format!("/{full}"), StatusCode::BAD_REQUEST));
            continue;
        };
        let target = account
            .containers
            .entry(c.to_owned())
            .or_insert_with(ContainerState::new);
        let mut headers = Headers::new();
        headers.set("Content-Type", "application/octet-stream");
        target.objects.insert(
            o.to_owned(),
            StoredObject {
                size: entry.data.len() as u64,
                etag: compute_md5(&entry.data),
                data: entry.data,
                headers,
                last_modified: Utc::now(),
                kind: ObjectKind::Plain,
            },
        );
        count += 1;
    }

    let code = if errors.is_empty() { StatusCode::CREATED } else { StatusCode::BAD_REQUEST };
    bulk_report(code, "", &errors, &[("Number Files Created", count)])
}
