//! Back-office catalog management.

#![allow(clippy::unwrap_used)]

use reqwest::multipart::{Form, Part};
use vitrine_integration_tests::{ADMIN, CUSTOMER, FakeApi, TestApp, location};

async fn admin_app(api: FakeApi) -> TestApp {
    api.add_user("Bruno Lima", "admin@example.com", "segredo1", ADMIN);
    let app = TestApp::spawn(api).await;
    let response = app.login("admin@example.com", "segredo1").await;
    assert_eq!(location(&response), Some("/admin"));
    app
}

fn fields(pairs: &[(&'static str, &'static str)]) -> Form {
    pairs
        .iter()
        .fold(Form::new(), |form, (name, value)| form.text(*name, *value))
}

#[tokio::test]
async fn blank_slug_is_derived_from_the_name() {
    let app = admin_app(FakeApi::new()).await;
    assert!(!app.page("/admin/categories").await.contains("Vestidos"));

    let response = app
        .post_multipart(
            "/admin/categories",
            fields(&[("name", "Vestidos"), ("slug", ""), ("description", "")]),
        )
        .await;
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), Some("/admin/categories"));

    let categories = app.api.categories();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0]["slug"], "vestidos");

    assert!(app.page("/admin/categories").await.contains("Vestidos"));
}

#[tokio::test]
async fn typed_slug_is_normalized() {
    let app = admin_app(FakeApi::new()).await;

    app.post_multipart(
        "/admin/categories",
        fields(&[("name", "Saias"), ("slug", "Saias Longas")]),
    )
    .await;
    assert_eq!(app.api.categories()[0]["slug"], "saias-longas");
}

#[tokio::test]
async fn duplicate_slug_shows_the_api_message() {
    let api = FakeApi::new();
    api.add_category("Vestidos", "vestidos");
    let app = admin_app(api).await;

    let response = app
        .post_multipart("/admin/categories", fields(&[("name", "Vestidos")]))
        .await;
    assert_eq!(response.status(), 200);
    assert!(response.text().await.unwrap().contains("Slug já cadastrado"));
    assert_eq!(app.api.categories().len(), 1);
}

#[tokio::test]
async fn created_product_appears_in_both_listings() {
    let api = FakeApi::new();
    let category = api.add_category("Vestidos", "vestidos").to_string();
    let app = admin_app(api).await;

    // Warm both caches first.
    assert!(!app.page("/admin/products").await.contains("Vestido Longo"));
    let shopper = app.visitor();
    assert!(!shopper.page("/products").await.contains("Vestido Longo"));

    let form = Form::new()
        .text("name", "Vestido Longo")
        .text("description", "Viscose estampada")
        .text("price", "249,90")
        .text("category_id", category)
        .text("is_active", "on")
        .text("variants", "P:Preto:2\nM:Preto:0");
    let response = app.post_multipart("/admin/products", form).await;
    assert_eq!(location(&response), Some("/admin/products"));

    let products = app.api.products();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["price"], "249.90");
    assert_eq!(products[0]["variants"].as_array().unwrap().len(), 2);
    assert_eq!(products[0]["variants"][0]["color"], "Preto");

    let admin_list = app.page("/admin/products").await;
    assert!(admin_list.contains("Vestido Longo"));
    assert!(admin_list.contains("Produto criado."));
    assert!(shopper.page("/products").await.contains("Vestido Longo"));
}

#[tokio::test]
async fn uploaded_image_is_stored_on_the_product() {
    let app = admin_app(FakeApi::new()).await;

    let image = Part::bytes(vec![0x89, b'P', b'N', b'G'])
        .file_name("vestido.png")
        .mime_str("image/png")
        .unwrap();
    let form = Form::new()
        .text("name", "Vestido Curto")
        .text("price", "99.90")
        .text("variants", "U:3")
        .part("image", image);
    let response = app.post_multipart("/admin/products", form).await;
    assert_eq!(response.status(), 303);

    assert_eq!(app.api.request_count("POST", "/api/upload"), 1);
    assert_eq!(
        app.api.products()[0]["image"],
        "https://cdn.example.com/vestido.png"
    );
}

#[tokio::test]
async fn invalid_product_form_is_not_sent() {
    let app = admin_app(FakeApi::new()).await;

    let image = Part::bytes(vec![1, 2, 3]).file_name("x.png");
    let form = Form::new()
        .text("name", "Blusa")
        .text("price", "grátis")
        .part("image", image);
    let response = app.post_multipart("/admin/products", form).await;
    assert_eq!(response.status(), 200);
    assert!(response.text().await.unwrap().contains("Informe um preço válido."));
    assert_eq!(app.api.request_count("POST", "/api/products"), 0);
    assert_eq!(app.api.request_count("POST", "/api/upload"), 0);
}

#[tokio::test]
async fn editing_and_deleting_refresh_the_listing() {
    let api = FakeApi::new();
    let id = api.add_product("Saia Midi", 15000, None, &[("M", 1)]);
    let app = admin_app(api).await;
    assert!(app.page("/admin/products").await.contains("Saia Midi"));

    let edit = app.page(&format!("/admin/products/{id}/edit")).await;
    assert!(edit.contains("M::1"));

    let form = Form::new()
        .text("name", "Saia Midi Plissada")
        .text("price", "159,90")
        .text("variants", "M:1");
    let response = app
        .post_multipart(&format!("/admin/products/{id}"), form)
        .await;
    assert_eq!(location(&response), Some("/admin/products"));
    assert!(app.page("/admin/products").await.contains("Saia Midi Plissada"));
    assert!(app.page(&format!("/products/{id}")).await.contains("R$ 159,90"));

    let response = app
        .post_form(&format!("/admin/products/{id}/delete"), &[])
        .await;
    assert_eq!(location(&response), Some("/admin/products"));
    let list = app.page("/admin/products").await;
    assert!(list.contains("Produto excluído."));
    assert!(!list.contains("Saia Midi Plissada"));
}

#[tokio::test]
async fn admin_changes_order_status() {
    let api = FakeApi::new();
    api.add_user("Ana Souza", "ana@example.com", "segredo1", CUSTOMER);
    let product = api.add_product("Vestido Midi", 5000, None, &[("P", 5)]);
    let variant = api.variant_ids(product)[0];
    let app = admin_app(api).await;

    let customer = app.visitor();
    customer.login("ana@example.com", "segredo1").await;
    customer
        .post_form(
            "/cart/add",
            &[
                ("product_id", product.to_string().as_str()),
                ("variant_id", variant.to_string().as_str()),
            ],
        )
        .await;
    customer
        .post_form(
            "/checkout",
            &[
                ("address_id", "new"),
                ("payment_method", "BOLETO"),
                ("street", "Rua das Flores"),
                ("number", "10"),
                ("neighborhood", "Centro"),
                ("city", "Curitiba"),
                ("state", "PR"),
                ("zip_code", "80020-000"),
            ],
        )
        .await;
    let order_id = app.api.orders()[0]["id"].as_u64().unwrap();

    assert!(app.page("/admin/orders").await.contains("Ana Souza"));
    let response = app
        .post_form(
            &format!("/admin/orders/{order_id}/status"),
            &[("status", "SHIPPED")],
        )
        .await;
    assert_eq!(
        location(&response),
        Some(format!("/admin/orders/{order_id}").as_str())
    );
    assert_eq!(app.api.orders()[0]["status"], "SHIPPED");

    let response = app
        .post_form(
            &format!("/admin/orders/{order_id}/status"),
            &[("status", "LOST")],
        )
        .await;
    assert_eq!(response.status(), 400);
}
