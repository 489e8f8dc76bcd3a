//! Form validation, registration, profile and contact.

#![allow(clippy::unwrap_used)]

use vitrine_integration_tests::{ADMIN, CUSTOMER, FakeApi, TestApp, location};

const MISMATCH: &str = "As senhas não coincidem.";

#[tokio::test]
async fn register_with_mismatched_passwords_stays_local() {
    let app = TestApp::spawn(FakeApi::new()).await;

    let response = app
        .post_form(
            "/register",
            &[
                ("name", "Carla Dias"),
                ("email", "carla@example.com"),
                ("password", "segredo1"),
                ("password_confirmation", "segredo2"),
            ],
        )
        .await;
    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains(MISMATCH));
    assert!(body.contains("carla@example.com"));
    assert_eq!(app.api.request_count("POST", "/api/auth/register"), 0);
}

#[tokio::test]
async fn register_signs_the_new_customer_in() {
    let app = TestApp::spawn(FakeApi::new()).await;

    let response = app
        .post_form(
            "/register",
            &[
                ("name", "Carla Dias"),
                ("email", "carla@example.com"),
                ("phone", ""),
                ("password", "segredo1"),
                ("password_confirmation", "segredo1"),
            ],
        )
        .await;
    assert_eq!(location(&response), Some("/"));
    assert!(app.page("/").await.contains("Olá, Carla!"));
    assert!(app.page("/account").await.contains("carla@example.com"));

    let users = app.api.users();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].role, CUSTOMER);
    assert!(users[0].phone.is_none());
}

#[tokio::test]
async fn duplicate_email_shows_the_api_message() {
    let api = FakeApi::new();
    api.add_user("Carla Dias", "carla@example.com", "segredo1", CUSTOMER);
    let app = TestApp::spawn(api).await;

    let response = app
        .post_form(
            "/register",
            &[
                ("name", "Outra Carla"),
                ("email", "carla@example.com"),
                ("password", "segredo1"),
                ("password_confirmation", "segredo1"),
            ],
        )
        .await;
    assert_eq!(response.status(), 200);
    assert!(response.text().await.unwrap().contains("E-mail já cadastrado"));
}

#[tokio::test]
async fn admin_user_form_checks_passwords_locally() {
    let api = FakeApi::new();
    api.add_user("Bruno Lima", "admin@example.com", "segredo1", ADMIN);
    let app = TestApp::spawn(api).await;
    app.login("admin@example.com", "segredo1").await;

    let response = app
        .post_form(
            "/admin/users",
            &[
                ("name", "Duda Reis"),
                ("email", "duda@example.com"),
                ("role", "ADMIN"),
                ("password", "segredo1"),
                ("password_confirmation", "outra123"),
            ],
        )
        .await;
    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains(MISMATCH));
    assert!(!body.contains("segredo1"));
    assert_eq!(app.api.request_count("POST", "/api/users"), 0);

    let response = app
        .post_form(
            "/admin/users",
            &[
                ("name", "Duda Reis"),
                ("email", "duda@example.com"),
                ("role", "ADMIN"),
                ("password", "segredo1"),
                ("password_confirmation", "segredo1"),
            ],
        )
        .await;
    assert_eq!(location(&response), Some("/admin/users"));
    assert!(app.page("/admin/users").await.contains("duda@example.com"));
    let duda = app
        .api
        .users()
        .into_iter()
        .find(|u| u.email == "duda@example.com")
        .unwrap();
    assert_eq!(duda.role, ADMIN);
}

#[tokio::test]
async fn admin_cannot_delete_own_account() {
    let api = FakeApi::new();
    let me = api.add_user("Bruno Lima", "admin@example.com", "segredo1", ADMIN);
    let app = TestApp::spawn(api).await;
    app.login("admin@example.com", "segredo1").await;

    let response = app
        .post_form(&format!("/admin/users/{me}/delete"), &[])
        .await;
    assert_eq!(location(&response), Some("/admin/users"));
    assert!(app
        .page("/admin/users")
        .await
        .contains("Você não pode excluir a própria conta."));
    assert_eq!(app.api.users().len(), 1);
    assert_eq!(app.api.request_count("DELETE", &format!("/api/users/{me}")), 0);
}

#[tokio::test]
async fn profile_update_refreshes_the_stored_user() {
    let api = FakeApi::new();
    api.add_user("Ana Souza", "ana@example.com", "segredo1", CUSTOMER);
    let app = TestApp::spawn(api).await;
    app.login("ana@example.com", "segredo1").await;

    let response = app
        .post_form(
            "/account",
            &[("name", "Ana Paula Souza"), ("phone", "11 99999-0000")],
        )
        .await;
    assert_eq!(location(&response), Some("/account"));
    let page = app.page("/account").await;
    assert!(page.contains("Dados atualizados."));
    assert!(page.contains("Ana Paula Souza"));
    assert_eq!(app.api.users()[0].phone.as_deref(), Some("11 99999-0000"));

    let response = app
        .post_form(
            "/account",
            &[
                ("name", "Ana Paula Souza"),
                ("password", "novasenha"),
                ("password_confirmation", "outrasenha"),
            ],
        )
        .await;
    assert_eq!(response.status(), 200);
    assert!(response.text().await.unwrap().contains(MISMATCH));
    assert_eq!(app.api.request_count("PUT", "/api/auth/profile"), 1);
}

#[tokio::test]
async fn saved_addresses_can_be_added_and_removed() {
    let api = FakeApi::new();
    api.add_user("Ana Souza", "ana@example.com", "segredo1", CUSTOMER);
    let app = TestApp::spawn(api).await;
    app.login("ana@example.com", "segredo1").await;

    let response = app
        .post_form(
            "/account/addresses",
            &[
                ("street", "Rua Augusta"),
                ("number", "1500"),
                ("neighborhood", "Consolação"),
                ("city", "São Paulo"),
                ("state", "SP"),
                ("zip_code", "01304-001"),
                ("is_default", "on"),
            ],
        )
        .await;
    assert_eq!(location(&response), Some("/account/addresses"));
    let page = app.page("/account/addresses").await;
    assert!(page.contains("Endereço salvo."));
    assert!(page.contains("Rua Augusta"));

    let id = page
        .split("/account/addresses/")
        .nth(1)
        .and_then(|rest| rest.split('/').next())
        .unwrap()
        .to_string();
    let response = app
        .post_form(&format!("/account/addresses/{id}/delete"), &[])
        .await;
    assert_eq!(location(&response), Some("/account/addresses"));
    assert!(!app.page("/account/addresses").await.contains("Rua Augusta"));
}

#[tokio::test]
async fn contact_message_is_forwarded() {
    let app = TestApp::spawn(FakeApi::new()).await;

    let response = app
        .post_form(
            "/contact/send",
            &[
                ("name", "Eva Martins"),
                ("email", "eva@example.com"),
                ("subject", ""),
                ("message", "Vocês entregam em Manaus?"),
            ],
        )
        .await;
    assert_eq!(location(&response), Some("/contact"));
    assert!(app
        .page("/contact")
        .await
        .contains("Mensagem enviada! Responderemos em breve."));

    let messages = app.api.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["email"], "eva@example.com");
    assert!(messages[0].get("subject").is_none());
}

#[tokio::test]
async fn contact_without_message_is_rejected_locally() {
    let app = TestApp::spawn(FakeApi::new()).await;

    let response = app
        .post_form(
            "/contact/send",
            &[("name", "Eva"), ("email", "eva@example.com"), ("message", " ")],
        )
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(app.api.request_count("POST", "/api/contact/send"), 0);
}
