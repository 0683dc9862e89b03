//! Account, container and object integration tests.

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use reqwest::Method;
    use rustwift::rustwift_headers::{AccountHeaders, ObjectHeaders};
    use rustwift::DeleteOptions;

    use crate::{account, cleanup_containers, create_test_container, random_bytes};

    #[tokio::test]
    #[ignore = "requires running Swift cluster"]
    async fn test_should_report_capabilities() {
        let account = account().await.expect("account");
        let caps = account.capabilities().await.expect("capabilities");
        assert!(caps.slo.is_some(), "SLO middleware should be enabled");
        assert!(caps.swift.max_file_size.is_some_and(|size| size > 0));
    }

    #[tokio::test]
    #[ignore = "requires running Swift cluster"]
    async fn test_should_upload_update_and_delete_object() {
        let account = account().await.expect("account");
        let container = create_test_container(&account, "obj").await.expect("container");

        let data = random_bytes(4096);
        let mut object = container.object("dir/blob.bin");
        let mut hdr = ObjectHeaders::new();
        hdr.content_type_mut().set("application/octet-stream".to_owned());
        hdr.metadata_mut().set("Origin", "integration");
        object.upload(data.clone(), &hdr, None).await.expect("upload");

        let headers = object.headers().await.expect("head");
        assert_eq!(headers.size_bytes().get(), Some(4096));
        assert_eq!(headers.metadata().get("origin"), Some("integration"));

        let mut hdr = ObjectHeaders::new();
        hdr.metadata_mut().set("Origin", "updated");
        object.update(&hdr, None).await.expect("update");
        assert_eq!(
            object.headers().await.expect("head").metadata().get("origin"),
            Some("updated")
        );

        let body = object.download(None).await.expect("download").bytes().await.expect("body");
        assert_eq!(body, data);

        let listed = container
            .objects()
            .with_delimiter("/")
            .collect_detailed()
            .await
            .expect("list");
        assert_eq!(listed.len(), 1);
        assert!(listed[0].is_subdirectory);
        assert_eq!(listed[0].object.name(), "dir/");

        object.delete(DeleteOptions::default(), None).await.expect("delete");
        let err = object.delete(DeleteOptions::default(), None).await.unwrap_err();
        assert!(err.is_status(reqwest::StatusCode::NOT_FOUND), "unexpected error: {err}");

        cleanup_containers(&account, &[container]).await;
    }

    #[tokio::test]
    #[ignore = "requires running Swift cluster"]
    async fn test_should_bulk_delete_objects_and_containers() {
        let account = account().await.expect("account");
        let container = create_test_container(&account, "bulk").await.expect("container");

        let mut objects = Vec::new();
        for i in 0..3 {
            let mut object = container.object(format!("item-{i}"));
            object
                .upload(format!("item {i}"), &ObjectHeaders::new(), None)
                .await
                .expect("upload");
            objects.push(object);
        }
        objects.push(container.object("never-existed"));

        let report = account
            .bulk_delete(&objects, std::slice::from_ref(&container), None)
            .await
            .expect("bulk delete");
        assert_eq!(report.deleted, 4);
        assert_eq!(report.not_found, 1);

        let mut container = container;
        assert!(!container.exists().await.expect("head container"));
    }

    #[tokio::test]
    #[ignore = "requires running Swift cluster"]
    async fn test_should_sign_working_temp_url() {
        let mut account = account().await.expect("account");
        let caps = account.capabilities().await.expect("capabilities");
        if caps.tempurl.is_none() {
            return;
        }
        let key = uuid::Uuid::new_v4().to_string();
        let mut hdr = AccountHeaders::new();
        hdr.temp_url_key_mut().set(key.clone());
        account.update(&hdr, None).await.expect("set temp url key");

        let container = create_test_container(&account, "tempurl").await.expect("container");
        let mut object = container.object("shared file.txt");
        object
            .upload("shared content", &ObjectHeaders::new(), None)
            .await
            .expect("upload");

        let url = object
            .temp_url(&key, Method::GET, Utc::now() + Duration::minutes(5), &[])
            .await
            .expect("temp url");
        let resp = reqwest::get(&url).await.expect("fetch");
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        assert_eq!(resp.text().await.expect("body"), "shared content");

        let head = reqwest::Client::new()
            .head(&url)
            .send()
            .await
            .expect("head with GET signature");
        assert_eq!(head.status(), reqwest::StatusCode::OK);

        let mut hdr = AccountHeaders::new();
        hdr.temp_url_key_mut().clear();
        account.update(&hdr, None).await.expect("clear temp url key");
        cleanup_containers(&account, &[container]).await;
    }
}
