use std::sync::Arc;

use bytes::Bytes;
use rand::RngExt;
use rustwift_headers::ObjectHeaders;

use super::manifest::ManifestRecord;
use super::*;
use crate::backend::MemoryBackend;
use crate::checksums::compute_md5;
use crate::iterator::ObjectInfo;
use crate::object::DeleteOptions;
use crate::{Account, Container};

struct Fixture {
    backend: Arc<MemoryBackend>,
    account: Account,
    segments: Container,
    target: Container,
}

async fn fixture() -> Fixture {
    let backend = Arc::new(MemoryBackend::new());
    let account = Account::new(backend.clone()).unwrap();
    let mut segments = account.container("segments");
    segments.ensure_exists().await.unwrap();
    let mut target = account.container("target");
    target.ensure_exists().await.unwrap();
    Fixture {
        backend,
        account,
        segments,
        target,
    }
}

fn random_buffer() -> [u8; 128] {
    let mut rng = rand::rng();
    let mut buf = [0u8; 128];
    rng.fill(&mut buf);
    buf
}

async fn new_large_object(
    f: &Fixture,
    name: &str,
    prefix: &str,
    strategy: LargeObjectStrategy,
) -> LargeObject {
    f.target
        .object(name)
        .as_new_large_object(
            SegmentingOptions {
                segment_container: Some(f.segments.clone()),
                segment_prefix: prefix.to_owned(),
                strategy,
            },
            TruncateOptions::default(),
        )
        .await
        .unwrap()
}

async fn content(object: &Object) -> Bytes {
    object.get(None).await.unwrap().bytes().await.unwrap()
}

async fn listing(container: &Container, prefix: &str) -> Vec<ObjectInfo> {
    container
        .objects()
        .with_prefix(prefix)
        .collect_detailed()
        .await
        .unwrap()
}

fn names(infos: &[ObjectInfo]) -> Vec<&str> {
    infos.iter().map(|info| info.object.name()).collect()
}

async fn raw_manifest(object: &Object) -> Vec<ManifestRecord> {
    let opts = RequestOptions::new()
        .with_value("multipart-manifest", "get")
        .with_value("format", "raw");
    let body = object.get(Some(&opts)).await.unwrap().bytes().await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_should_append_segments_and_continue_numbering() {
    let f = fixture().await;
    let (buf1, buf2) = (random_buffer(), random_buffer());

    let mut lo = new_large_object(&f, "data", "seg/", LargeObjectStrategy::Static).await;
    lo.append(&buf1[..], 0).await.unwrap();
    lo.append(&buf2[..], 0).await.unwrap();
    lo.write_manifest(None).await.unwrap();

    assert_eq!(content(lo.object()).await, [buf1, buf2].concat());
    let listed = listing(&f.segments, "seg/").await;
    assert_eq!(names(&listed), ["seg/0000000000000001", "seg/0000000000000002"]);
    for (info, buf) in listed.iter().zip([&buf1, &buf2]) {
        assert_eq!(info.size_bytes, 128);
        assert_eq!(info.etag, compute_md5(buf));
    }

    let (buf3, buf4) = (random_buffer(), random_buffer());
    let mut lo = f.target.object("data").as_large_object().await.unwrap();
    assert_eq!(lo.strategy(), LargeObjectStrategy::Static);
    assert_eq!(lo.segments().len(), 2);
    lo.append(&[buf3, buf4].concat()[..], 128).await.unwrap();
    lo.write_manifest(None).await.unwrap();

    let listed = listing(&f.segments, "seg/").await;
    assert_eq!(
        names(&listed),
        [
            "seg/0000000000000001",
            "seg/0000000000000002",
            "seg/0000000000000003",
            "seg/0000000000000004",
        ]
    );
    assert_eq!(content(lo.object()).await, [buf1, buf2, buf3, buf4].concat());

    lo.truncate(true).await.unwrap();
    assert!(listing(&f.segments, "seg/").await.is_empty());

    let (buf5, buf6) = (random_buffer(), random_buffer());
    lo.append(&buf5[..], 0).await.unwrap();
    lo.append(&buf6[..], 0).await.unwrap();
    lo.write_manifest(None).await.unwrap();
    assert_eq!(content(lo.object()).await, [buf5, buf6].concat());
    assert_eq!(
        names(&listing(&f.segments, "seg/").await),
        ["seg/0000000000000001", "seg/0000000000000002"]
    );
}

#[tokio::test]
async fn test_should_assemble_ranges_of_one_object() {
    let f = fixture().await;
    let mut backing = f.segments.object("backing");
    backing
        .upload("aaaaaXbbbbbXccccc", &ObjectHeaders::new(), None)
        .await
        .unwrap();

    let mut lo = new_large_object(&f, "ranged", "ranged/", LargeObjectStrategy::Static).await;
    for range in [
        SegmentRange::new(0, 5),
        SegmentRange::new(6, 5),
        SegmentRange::suffix(5),
    ] {
        lo.add_segment(ObjectSegment {
            range,
            ..ObjectSegment::new(backing.clone())
        })
        .unwrap();
    }
    lo.write_manifest(None).await.unwrap();

    assert_eq!(&content(lo.object()).await[..], b"aaaaabbbbbccccc");
    let ranges: Vec<_> = raw_manifest(lo.object())
        .await
        .into_iter()
        .map(|r| r.range)
        .collect();
    assert_eq!(
        ranges,
        [
            Some("0-4".to_owned()),
            Some("6-10".to_owned()),
            Some("-5".to_owned())
        ]
    );
}

#[tokio::test]
async fn test_should_mix_inline_data_with_object_segments() {
    let f = fixture().await;
    let (buf1, buf2) = (random_buffer(), random_buffer());

    let mut lo = new_large_object(&f, "mixed", "mixed/", LargeObjectStrategy::Static).await;
    lo.append(&buf1[..], 0).await.unwrap();
    lo.add_segment(SegmentInfo::Data(Bytes::from_static(b"---")))
        .unwrap();
    lo.append(&buf2[..], 0).await.unwrap();
    lo.write_manifest(None).await.unwrap();

    assert_eq!(content(lo.object()).await, [&buf1[..], &b"---"[..], &buf2[..]].concat());

    let records = raw_manifest(lo.object()).await;
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].path, "/segments/mixed/0000000000000001");
    assert_eq!(records[1].data.as_deref(), Some("LS0t"));
    assert!(records[1].path.is_empty());
    assert_eq!(records[2].path, "/segments/mixed/0000000000000002");
}

#[tokio::test]
async fn test_should_infer_segment_location_on_reopen() {
    let f = fixture().await;
    let mut lo = new_large_object(&f, "nested", "foo/bar/baz/", LargeObjectStrategy::Static).await;
    let mut writer = lo.open(OpenMode::Truncate).await.unwrap();
    writer.write(&random_buffer()).await.unwrap();
    writer.write(&random_buffer()).await.unwrap();
    writer.close().await.unwrap();

    let lo = f.target.object("nested").as_large_object().await.unwrap();
    assert_eq!(lo.segment_prefix(), "foo/bar/baz/");
    assert_eq!(lo.segment_container(), Some(&f.segments));
    assert_eq!(
        lo.next_segment_object().unwrap().name(),
        "foo/bar/baz/0000000000000003"
    );
}

#[tokio::test]
async fn test_should_rewrite_same_manifest_after_reopen() {
    let f = fixture().await;
    let mut backing = f.segments.object("parts/backing");
    backing
        .upload("0123456789", &ObjectHeaders::new(), None)
        .await
        .unwrap();

    let mut lo = new_large_object(&f, "roundtrip", "parts/", LargeObjectStrategy::Static).await;
    lo.append(&random_buffer()[..], 0).await.unwrap();
    lo.add_segment(SegmentInfo::Data(Bytes::from_static(b"inline")))
        .unwrap();
    lo.add_segment(ObjectSegment {
        range: SegmentRange::new(3, 0),
        ..ObjectSegment::new(backing.clone())
    })
    .unwrap();
    lo.write_manifest(None).await.unwrap();
    let before = content(lo.object()).await;

    let mut reopened = f.target.object("roundtrip").as_large_object().await.unwrap();
    let parsed = raw_manifest(reopened.object()).await;
    let rendered: Vec<ManifestRecord> = reopened
        .segments()
        .iter()
        .map(ManifestRecord::from_segment)
        .collect();
    assert_eq!(
        serde_json::to_vec(&rendered).unwrap(),
        serde_json::to_vec(&parsed).unwrap()
    );

    reopened.write_manifest(None).await.unwrap();
    assert_eq!(content(reopened.object()).await, before);
    assert_eq!(raw_manifest(reopened.object()).await, parsed);
}

#[tokio::test]
async fn test_should_open_missing_object_as_empty_view() {
    let f = fixture().await;
    let mut lo = f.target.object("missing").as_large_object().await.unwrap();
    assert!(lo.segments().is_empty());
    assert!(lo.segment_container().is_none());
    assert_eq!(lo.segment_prefix(), "");
    assert_eq!(lo.strategy(), LargeObjectStrategy::Static);

    let err = lo.open(OpenMode::Append).await.unwrap_err();
    assert!(matches!(err, Error::NoContainerName));
    let err = lo.append(&b"data"[..], 0).await.unwrap_err();
    assert!(matches!(err, Error::NoContainerName));
}

#[tokio::test]
async fn test_should_reject_regular_object() {
    let f = fixture().await;
    let mut object = f.target.object("plain");
    object
        .upload("just bytes", &ObjectHeaders::new(), None)
        .await
        .unwrap();
    let err = object.as_large_object().await.unwrap_err();
    assert!(matches!(err, Error::NotLarge));
}

#[tokio::test]
async fn test_should_not_request_on_add_segment() {
    let f = fixture().await;
    let other = f.account.switch_account("AUTH_other").unwrap();
    let mut lo = new_large_object(&f, "quiet", "quiet/", LargeObjectStrategy::Static).await;
    let before = f.backend.request_count();

    lo.add_segment(ObjectSegment::new(f.segments.object("quiet/0001")))
        .unwrap();
    lo.add_segment(SegmentInfo::Data(Bytes::from_static(b"x")))
        .unwrap();
    let err = lo
        .add_segment(ObjectSegment::new(other.container("segments").object("x")))
        .unwrap_err();
    assert!(matches!(err, Error::AccountMismatch));

    assert_eq!(f.backend.request_count(), before);
    assert_eq!(lo.segments().len(), 2);
}

#[tokio::test]
async fn test_should_validate_static_segments() {
    let f = fixture().await;
    let mut lo = new_large_object(&f, "static", "s/", LargeObjectStrategy::Static).await;
    let object = f.segments.object("s/0001");

    let err = lo
        .add_segment(ObjectSegment {
            range: SegmentRange::new(-1, 0),
            ..ObjectSegment::new(object.clone())
        })
        .unwrap_err();
    assert!(matches!(err, Error::SegmentInvalid(_)));

    let err = lo.add_segment(SegmentInfo::Data(Bytes::new())).unwrap_err();
    assert!(matches!(err, Error::SegmentInvalid(_)));

    // any container is fine for a static large object
    lo.add_segment(ObjectSegment {
        range: SegmentRange::new(2, 3),
        ..ObjectSegment::new(f.target.object("elsewhere"))
    })
    .unwrap();
    assert_eq!(lo.segments().len(), 1);
}

#[tokio::test]
async fn test_should_validate_dynamic_segments() {
    let f = fixture().await;
    let mut lo = new_large_object(&f, "dynamic", "d/", LargeObjectStrategy::Dynamic).await;

    let err = lo
        .add_segment(ObjectSegment {
            range: SegmentRange::new(0, 10),
            ..ObjectSegment::new(f.segments.object("d/0001"))
        })
        .unwrap_err();
    assert!(matches!(err, Error::SegmentInvalid(_)));

    let err = lo
        .add_segment(ObjectSegment::new(f.target.object("d/0001")))
        .unwrap_err();
    assert!(matches!(err, Error::ContainerMismatch));

    let err = lo
        .add_segment(ObjectSegment::new(f.segments.object("e/0001")))
        .unwrap_err();
    assert!(matches!(err, Error::ContainerMismatch));

    let err = lo
        .add_segment(SegmentInfo::Data(Bytes::from_static(b"inline")))
        .unwrap_err();
    assert!(matches!(err, Error::SegmentInvalid(_)));

    lo.add_segment(ObjectSegment::new(f.segments.object("d/0001")))
        .unwrap();
    assert_eq!(lo.segments().len(), 1);
}

#[tokio::test]
async fn test_should_reject_foreign_segment_container() {
    let f = fixture().await;
    let other = f.account.switch_account("AUTH_other").unwrap();

    let err = f
        .target
        .object("x")
        .as_new_large_object(
            SegmentingOptions {
                segment_container: Some(other.container("segments")),
                ..Default::default()
            },
            TruncateOptions::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AccountMismatch));

    let err = f
        .target
        .object("x")
        .as_new_large_object(SegmentingOptions::default(), TruncateOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NoContainerName));

    let mut lo = new_large_object(&f, "x", "x/", LargeObjectStrategy::Static).await;
    lo.set_segment_container(other.container("segments"));
    let err = lo.open(OpenMode::Append).await.unwrap_err();
    assert!(matches!(err, Error::AccountMismatch));
}

#[tokio::test]
async fn test_should_cut_segments_at_segment_size() {
    let f = fixture().await;
    let data: Vec<u8> = (0..250u32).map(|i| (i % 256) as u8).collect();

    let mut lo = new_large_object(&f, "cut", "cut/", LargeObjectStrategy::Static).await;
    let mut writer = lo.open(OpenMode::Truncate).await.unwrap().with_segment_size(100);
    for chunk in data.chunks(70) {
        assert_eq!(writer.write(chunk).await.unwrap(), chunk.len());
    }
    assert_eq!(writer.large_object().segments().len(), 2);
    writer.close().await.unwrap();

    let sizes: Vec<u64> = listing(&f.segments, "cut/")
        .await
        .iter()
        .map(|info| info.size_bytes)
        .collect();
    assert_eq!(sizes, [100, 100, 50]);
    assert_eq!(&content(lo.object()).await[..], &data[..]);
}

#[tokio::test]
async fn test_should_write_one_segment_per_call() {
    let f = fixture().await;
    let mut lo = new_large_object(&f, "calls", "calls/", LargeObjectStrategy::Static).await;
    let mut writer = lo.open(OpenMode::Truncate).await.unwrap();
    writer.write(b"one ").await.unwrap();
    writer.write(b"").await.unwrap();
    writer.write(b"two").await.unwrap();
    writer.close().await.unwrap();

    assert_eq!(lo.segments().len(), 2);
    assert_eq!(&content(lo.object()).await[..], b"one two");
}

#[tokio::test]
async fn test_should_honor_open_modes() {
    let f = fixture().await;
    let mut lo = new_large_object(&f, "modes", "modes/", LargeObjectStrategy::Static).await;
    lo.append(&b"first"[..], 0).await.unwrap();
    lo.write_manifest(None).await.unwrap();

    let mut writer = lo.open(OpenMode::Append).await.unwrap();
    writer.write(b"second").await.unwrap();
    writer.close().await.unwrap();
    assert_eq!(&content(lo.object()).await[..], b"firstsecond");

    let mut writer = lo.open(OpenMode::TruncateKeepSegments).await.unwrap();
    writer.write(b"third").await.unwrap();
    writer.close().await.unwrap();
    assert_eq!(&content(lo.object()).await[..], b"third");
    // the old segments stay and the new one overwrites the first name
    assert_eq!(listing(&f.segments, "modes/").await.len(), 2);

    let writer = lo.open(OpenMode::Truncate).await.unwrap();
    writer.close().await.unwrap();
    assert!(lo.segments().is_empty());
    assert_eq!(names(&listing(&f.segments, "modes/").await), ["modes/0000000000000002"]);
    assert!(content(lo.object()).await.is_empty());
}

#[tokio::test]
async fn test_should_write_and_reopen_dynamic_large_object() {
    let f = fixture().await;
    let mut lo = new_large_object(&f, "dlo", "dlo/", LargeObjectStrategy::Dynamic).await;
    let mut writer = lo.open(OpenMode::Truncate).await.unwrap();
    writer.write(b"hello ").await.unwrap();
    writer.write(b"world").await.unwrap();
    writer.close().await.unwrap();

    let mut object = f.target.object("dlo");
    let headers = object.headers().await.unwrap();
    assert_eq!(
        headers.large_object_manifest().get().as_deref(),
        Some("segments/dlo/")
    );
    assert_eq!(&content(&object).await[..], b"hello world");

    let mut reopened = object.as_large_object().await.unwrap();
    assert_eq!(reopened.strategy(), LargeObjectStrategy::Dynamic);
    assert_eq!(reopened.segment_prefix(), "dlo/");
    assert_eq!(reopened.segment_container(), Some(&f.segments));
    assert_eq!(reopened.segments().len(), 2);

    reopened.object_mut().invalidate();
    let before = f.backend.request_count();
    reopened.write_manifest(None).await.unwrap();
    assert_eq!(f.backend.request_count(), before + 1);

    reopened.append(&b"!"[..], 0).await.unwrap();
    assert_eq!(&content(&object).await[..], b"hello world!");
}

#[tokio::test]
async fn test_should_refuse_dynamic_manifest_in_foreign_account() {
    let f = fixture().await;
    let other = f.account.switch_account("AUTH_other").unwrap();
    let mut lo = new_large_object(&f, "dlo", "dlo/", LargeObjectStrategy::Dynamic).await;
    lo.set_segment_container(other.container("segments"));

    let before = f.backend.request_count();
    let err = lo.write_manifest(None).await.unwrap_err();
    assert!(matches!(err, Error::AccountMismatch));
    assert_eq!(f.backend.request_count(), before);
    assert!(!f.target.object("dlo").exists().await.unwrap());
}

#[tokio::test]
async fn test_should_convert_static_to_dynamic() {
    let f = fixture().await;
    let mut lo = new_large_object(&f, "convert", "conv/", LargeObjectStrategy::Static).await;
    lo.append(&b"abcdef"[..], 3).await.unwrap();
    lo.write_manifest(None).await.unwrap();
    assert!(lo.object_mut().headers().await.unwrap().is_static_large_object());

    lo.set_strategy(LargeObjectStrategy::Dynamic);
    lo.write_manifest(None).await.unwrap();
    let headers = lo.object_mut().headers().await.unwrap();
    assert!(!headers.is_static_large_object());
    assert!(headers.is_dynamic_large_object());
    assert_eq!(&content(lo.object()).await[..], b"abcdef");
}

#[tokio::test]
async fn test_should_delete_segments_with_object() {
    let f = fixture().await;
    let mut lo = new_large_object(&f, "doomed", "doomed/", LargeObjectStrategy::Static).await;
    lo.append(&random_buffer()[..], 64).await.unwrap();
    lo.write_manifest(None).await.unwrap();
    assert_eq!(lo.segment_objects().len(), 2);

    let mut object = f.target.object("doomed");
    object
        .delete(DeleteOptions { delete_segments: true }, None)
        .await
        .unwrap();
    assert!(!object.exists().await.unwrap());
    assert!(listing(&f.segments, "doomed/").await.is_empty());
}

#[tokio::test]
async fn test_should_keep_segments_on_request() {
    let f = fixture().await;
    let mut lo = new_large_object(&f, "kept", "kept/", LargeObjectStrategy::Static).await;
    lo.append(&b"payload"[..], 0).await.unwrap();
    lo.write_manifest(None).await.unwrap();

    let lo = f
        .target
        .object("kept")
        .as_new_large_object(
            SegmentingOptions {
                segment_container: Some(f.segments.clone()),
                segment_prefix: "kept/".to_owned(),
                strategy: LargeObjectStrategy::Static,
            },
            TruncateOptions { keep_segments: true },
        )
        .await
        .unwrap();
    assert!(lo.segments().is_empty());
    assert_eq!(listing(&f.segments, "kept/").await.len(), 1);

    // the manifest was never rewritten, so the segment is still referenced
    new_large_object(&f, "kept", "kept/", LargeObjectStrategy::Static).await;
    assert!(listing(&f.segments, "kept/").await.is_empty());
}

#[tokio::test]
async fn test_should_dedup_segment_objects() {
    let f = fixture().await;
    let mut lo = new_large_object(&f, "dedup", "dd/", LargeObjectStrategy::Static).await;
    let a = f.segments.object("dd/a");
    let b = f.segments.object("dd/b");
    for object in [&a, &b, &a] {
        lo.add_segment(ObjectSegment::new(object.clone())).unwrap();
    }
    assert_eq!(lo.segment_objects(), [a, b]);
}
