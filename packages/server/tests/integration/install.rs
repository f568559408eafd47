use serde_json::json;

use crate::common::{TestApp, routes};

mod install_flow {
    use super::*;

    #[tokio::test]
    async fn fresh_system_reports_needs_setup_to_anyone() {
        let app = TestApp::spawn().await;

        let res = app.get(&app.client, routes::INSTALL_CHECK).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["needs_setup"], true);
        assert_eq!(res.body["database_connected"], true);
    }

    #[tokio::test]
    async fn setup_creates_the_admin_and_seeds_demo_content() {
        let app = TestApp::spawn().await;

        let res = app
            .post(
                &app.client,
                routes::INSTALL_SETUP,
                &json!({
                    "admin_username": "root",
                    "admin_password": "Sup3r_secret",
                    "site_name": "My CTF",
                }),
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["success"], true);

        // The created admin can log in.
        let login = app
            .post(
                &app.client,
                routes::ADMIN_LOGIN,
                &json!({"username": "root", "password": "Sup3r_secret"}),
            )
            .await;
        assert_eq!(login.status, 200, "{}", login.text);

        // Demo content was seeded into the empty database.
        let challenges = app.get(&app.client, routes::CHALLENGES).await;
        assert!(!challenges.body.as_array().unwrap().is_empty());

        let site = app.get(&app.client, routes::SITE_INFO).await;
        assert_eq!(site.body["site_name"], "My CTF");
    }

    #[tokio::test]
    async fn install_endpoints_lock_down_once_installed() {
        let app = TestApp::spawn().await;

        let setup = app
            .post(
                &app.client,
                routes::INSTALL_SETUP,
                &json!({"admin_username": "root", "admin_password": "Sup3r_secret"}),
            )
            .await;
        assert_eq!(setup.status, 200);

        // Anonymous callers are shut out of the install checks now.
        let anonymous = TestApp::new_browser();
        let res = app.get(&anonymous, routes::INSTALL_CHECK).await;
        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "ACCESS_DENIED");

        let res = app.get(&anonymous, routes::SYSTEM_CHECK).await;
        assert_eq!(res.status, 403);

        // An admin still gets through.
        let admin = TestApp::new_browser();
        let login = app
            .post(
                &admin,
                routes::ADMIN_LOGIN,
                &json!({"username": "root", "password": "Sup3r_secret"}),
            )
            .await;
        assert_eq!(login.status, 200);

        let res = app.get(&admin, routes::INSTALL_CHECK).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["needs_setup"], false);
    }

    #[tokio::test]
    async fn second_setup_is_refused() {
        let app = TestApp::spawn().await;

        let first = app
            .post(
                &app.client,
                routes::INSTALL_SETUP,
                &json!({"admin_username": "root", "admin_password": "Sup3r_secret"}),
            )
            .await;
        assert_eq!(first.status, 200);

        let second = app
            .post(
                &app.client,
                routes::INSTALL_SETUP,
                &json!({"admin_username": "other", "admin_password": "An0ther_secret"}),
            )
            .await;
        assert_eq!(second.status, 409);
    }

    #[tokio::test]
    async fn setup_enforces_the_password_policy() {
        let app = TestApp::spawn().await;

        let res = app
            .post(
                &app.client,
                routes::INSTALL_SETUP,
                &json!({"admin_username": "root", "admin_password": "weakpass"}),
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");

        // A failed setup leaves the system uninstalled.
        let check = app.get(&app.client, routes::INSTALL_CHECK).await;
        assert_eq!(check.body["needs_setup"], true);
    }
}
