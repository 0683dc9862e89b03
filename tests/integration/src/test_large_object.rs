//! Large object integration tests.

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use rustwift::large_object::{
        LargeObjectStrategy, ObjectSegment, OpenMode, SegmentInfo, SegmentRange, SegmentingOptions,
        TruncateOptions,
    };
    use rustwift::rustwift_headers::ObjectHeaders;
    use rustwift::{Container, DeleteOptions, Error};

    use crate::{account, cleanup_containers, create_test_container, random_bytes};

    fn segmenting(container: &Container, prefix: &str) -> SegmentingOptions {
        SegmentingOptions {
            segment_container: Some(container.clone()),
            segment_prefix: prefix.to_owned(),
            strategy: LargeObjectStrategy::Static,
        }
    }

    async fn segment_names(container: &Container, prefix: &str) -> Vec<String> {
        container
            .objects()
            .with_prefix(prefix)
            .collect()
            .await
            .expect("list segments")
            .iter()
            .map(|o| o.name().to_owned())
            .collect()
    }

    #[tokio::test]
    #[ignore = "requires running Swift cluster"]
    async fn test_should_append_truncate_and_renumber() {
        let account = account().await.expect("account");
        let segments = create_test_container(&account, "seg").await.expect("container");
        let target = create_test_container(&account, "slo").await.expect("container");

        let mut object = target.object("data");
        let mut lo = object
            .as_new_large_object(segmenting(&segments, "seg/"), TruncateOptions::default())
            .await
            .expect("new large object");
        let (buf1, buf2) = (random_bytes(128), random_bytes(128));
        lo.append(&buf1[..], 0).await.expect("append");
        lo.append(&buf2[..], 0).await.expect("append");
        lo.write_manifest(None).await.expect("manifest");

        let body = object.download(None).await.expect("download").bytes().await.expect("body");
        assert_eq!(body, [buf1.clone(), buf2.clone()].concat());
        assert_eq!(
            segment_names(&segments, "seg/").await,
            ["seg/0000000000000001", "seg/0000000000000002"]
        );

        let mut lo = object.as_large_object().await.expect("open");
        let (buf3, buf4) = (random_bytes(128), random_bytes(128));
        lo.append(&buf3[..], 0).await.expect("append");
        lo.append(&buf4[..], 0).await.expect("append");
        lo.write_manifest(None).await.expect("manifest");
        assert_eq!(segment_names(&segments, "seg/").await.len(), 4);
        let body = object.download(None).await.expect("download").bytes().await.expect("body");
        assert_eq!(body, [buf1, buf2, buf3, buf4].concat());

        lo.truncate(true).await.expect("truncate");
        assert!(segment_names(&segments, "seg/").await.is_empty());
        let (buf5, buf6) = (random_bytes(128), random_bytes(128));
        lo.append(&buf5[..], 0).await.expect("append");
        lo.append(&buf6[..], 0).await.expect("append");
        lo.write_manifest(None).await.expect("manifest");
        let body = object.download(None).await.expect("download").bytes().await.expect("body");
        assert_eq!(body, [buf5, buf6].concat());
        assert_eq!(
            segment_names(&segments, "seg/").await,
            ["seg/0000000000000001", "seg/0000000000000002"]
        );

        cleanup_containers(&account, &[segments, target]).await;
    }

    #[tokio::test]
    #[ignore = "requires running Swift cluster"]
    async fn test_should_assemble_ranges_and_inline_data() {
        let account = account().await.expect("account");
        let segments = create_test_container(&account, "seg").await.expect("container");
        let target = create_test_container(&account, "slo").await.expect("container");

        let mut backing = segments.object("ranges/backing");
        backing
            .upload("aaaaaXbbbbbXccccc", &ObjectHeaders::new(), None)
            .await
            .expect("upload backing");

        let mut object = target.object("ranged");
        let mut lo = object
            .as_new_large_object(segmenting(&segments, "ranges/"), TruncateOptions::default())
            .await
            .expect("new large object");
        for range in [
            SegmentRange::new(0, 5),
            SegmentRange::new(6, 5),
            SegmentRange::suffix(5),
        ] {
            lo.add_segment(ObjectSegment {
                range,
                ..ObjectSegment::new(backing.clone())
            })
            .expect("add range");
        }
        lo.add_segment(SegmentInfo::Data(Bytes::from_static(b"---")))
            .expect("add data");
        lo.write_manifest(None).await.expect("manifest");

        let body = object.download(None).await.expect("download").bytes().await.expect("body");
        assert_eq!(&body[..], b"aaaaabbbbbccccc---");

        cleanup_containers(&account, &[segments, target]).await;
    }

    #[tokio::test]
    #[ignore = "requires running Swift cluster"]
    async fn test_should_reopen_with_inferred_location() {
        let account = account().await.expect("account");
        let segments = create_test_container(&account, "seg").await.expect("container");
        let target = create_test_container(&account, "slo").await.expect("container");

        let mut object = target.object("nested");
        let mut lo = object
            .as_new_large_object(segmenting(&segments, "foo/bar/baz/"), TruncateOptions::default())
            .await
            .expect("new large object");
        let mut writer = lo
            .open(OpenMode::Truncate)
            .await
            .expect("open")
            .with_segment_size(100);
        writer.write(&random_bytes(250)).await.expect("write");
        writer.close().await.expect("close");

        let reopened = target.object("nested").as_large_object().await.expect("reopen");
        assert_eq!(reopened.segment_prefix(), "foo/bar/baz/");
        assert_eq!(reopened.segment_container(), Some(&segments));
        assert_eq!(reopened.segments().len(), 3);

        object
            .delete(DeleteOptions { delete_segments: true }, None)
            .await
            .expect("delete");
        assert!(segment_names(&segments, "foo/").await.is_empty());

        cleanup_containers(&account, &[segments, target]).await;
    }

    #[tokio::test]
    #[ignore = "requires running Swift cluster"]
    async fn test_should_write_dynamic_large_object() {
        let account = account().await.expect("account");
        let segments = create_test_container(&account, "seg").await.expect("container");
        let target = create_test_container(&account, "dlo").await.expect("container");

        let mut object = target.object("dynamic");
        let mut options = segmenting(&segments, "dlo/");
        options.strategy = LargeObjectStrategy::Dynamic;
        let mut lo = object
            .as_new_large_object(options, TruncateOptions::default())
            .await
            .expect("new large object");
        lo.append(&b"hello world"[..], 4).await.expect("append");
        lo.write_manifest(None).await.expect("manifest");

        let body = object.download(None).await.expect("download").text().await.expect("body");
        assert_eq!(body, "hello world");
        let reopened = object.as_large_object().await.expect("reopen");
        assert_eq!(reopened.strategy(), LargeObjectStrategy::Dynamic);
        assert_eq!(reopened.segments().len(), 3);

        cleanup_containers(&account, &[segments, target]).await;
    }

    #[tokio::test]
    #[ignore = "requires running Swift cluster"]
    async fn test_should_reject_regular_object() {
        let account = account().await.expect("account");
        let target = create_test_container(&account, "plain").await.expect("container");

        let mut object = target.object("plain");
        object
            .upload("not large", &ObjectHeaders::new(), None)
            .await
            .expect("upload");
        let err = object.as_large_object().await.unwrap_err();
        assert!(matches!(err, Error::NotLarge), "unexpected error: {err}");

        cleanup_containers(&account, &[target]).await;
    }
}
