//! Cart totals, per-user carts and checkout.

#![allow(clippy::unwrap_used)]

use vitrine_integration_tests::{CUSTOMER, FakeApi, TestApp, location};

struct Shop {
    api: FakeApi,
    dress: u64,
    skirt: u64,
}

fn shop() -> Shop {
    let api = FakeApi::new();
    api.add_user("Ana Souza", "ana@example.com", "segredo1", CUSTOMER);
    api.add_user("Bia Costa", "bia@example.com", "segredo1", CUSTOMER);
    let category = api.add_category("Vestidos", "vestidos");
    let dress = api.add_product("Vestido Midi", 5000, Some(category), &[("P", 5), ("M", 2)]);
    let skirt = api.add_product("Saia Plissada", 3000, None, &[("U", 4)]);
    Shop { api, dress, skirt }
}

async fn add(app: &TestApp, product: u64, variant: u64, quantity: u32) {
    let product = product.to_string();
    let variant = variant.to_string();
    let quantity = quantity.to_string();
    let response = app
        .post_form(
            "/cart/add",
            &[
                ("product_id", product.as_str()),
                ("variant_id", variant.as_str()),
                ("quantity", quantity.as_str()),
            ],
        )
        .await;
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), Some("/cart"));
}

#[tokio::test]
async fn cart_shows_subtotal_shipping_and_total() {
    let Shop { api, dress, skirt } = shop();
    let dress_p = api.variant_ids(dress)[0];
    let skirt_u = api.variant_ids(skirt)[0];
    let app = TestApp::spawn(api).await;
    app.login("ana@example.com", "segredo1").await;

    add(&app, dress, dress_p, 2).await;
    add(&app, skirt, skirt_u, 1).await;

    let cart = app.page("/cart").await;
    assert!(cart.contains("Vestido Midi"));
    assert!(cart.contains("Saia Plissada"));
    assert!(cart.contains("R$ 130,00"), "subtotal");
    assert!(cart.contains("R$ 15,00"), "shipping");
    assert!(cart.contains("R$ 145,00"), "total");
}

#[tokio::test]
async fn empty_cart_has_no_shipping_and_skips_checkout() {
    let Shop { api, .. } = shop();
    let app = TestApp::spawn(api).await;
    app.login("ana@example.com", "segredo1").await;

    let cart = app.page("/cart").await;
    assert!(cart.contains("Seu carrinho está vazio."));
    assert!(!cart.contains("R$ 15,00"));

    let response = app.get("/checkout").await;
    assert_eq!(location(&response), Some("/cart"));
}

#[tokio::test]
async fn carts_are_private_to_each_customer() {
    let Shop { api, dress, .. } = shop();
    let dress_m = api.variant_ids(dress)[1];
    let ana = TestApp::spawn(api).await;
    ana.login("ana@example.com", "segredo1").await;
    add(&ana, dress, dress_m, 1).await;
    assert!(ana.page("/cart").await.contains("Vestido Midi"));

    let bia = ana.visitor();
    bia.login("bia@example.com", "segredo1").await;
    let cart = bia.page("/cart").await;
    assert!(!cart.contains("Vestido Midi"));
    assert!(cart.contains("Seu carrinho está vazio."));

    // Ana's cart survives Bia's visit.
    assert!(ana.page("/cart").await.contains("Vestido Midi"));
}

#[tokio::test]
async fn removing_a_line_refreshes_the_cart() {
    let Shop { api, dress, skirt } = shop();
    let dress_p = api.variant_ids(dress)[0];
    let skirt_u = api.variant_ids(skirt)[0];
    let app = TestApp::spawn(api).await;
    app.login("ana@example.com", "segredo1").await;
    add(&app, dress, dress_p, 1).await;
    add(&app, skirt, skirt_u, 1).await;
    assert!(app.page("/cart").await.contains("R$ 80,00"));

    let line_id = app
        .page("/cart")
        .await
        .split("/cart/items/")
        .nth(1)
        .and_then(|rest| rest.split('"').next())
        .unwrap()
        .to_string();
    let response = app
        .post_form(&format!("/cart/items/{line_id}/remove"), &[])
        .await;
    assert_eq!(location(&response), Some("/cart"));

    let page = app.page("/cart").await;
    assert!(!page.contains("Vestido Midi"));
    assert!(page.contains("Saia Plissada"));
    assert!(page.contains("R$ 45,00"));
}

#[tokio::test]
async fn checkout_places_an_order_with_a_new_address() {
    let Shop { api, dress, .. } = shop();
    let dress_p = api.variant_ids(dress)[0];
    let app = TestApp::spawn(api).await;
    app.login("ana@example.com", "segredo1").await;
    add(&app, dress, dress_p, 2).await;

    let checkout = app.page("/checkout").await;
    assert!(checkout.contains("R$ 115,00"));

    let response = app
        .post_form(
            "/checkout",
            &[
                ("address_id", "new"),
                ("payment_method", "PIX"),
                ("street", "Rua Augusta"),
                ("number", "1500"),
                ("neighborhood", "Consolação"),
                ("city", "São Paulo"),
                ("state", "sp"),
                ("zip_code", "01304-001"),
            ],
        )
        .await;
    assert_eq!(response.status(), 303);
    let target = location(&response).unwrap().to_string();
    assert!(target.starts_with("/account/orders/"), "{target}");

    let orders = app.api.orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["payment"]["method"], "PIX");
    assert_eq!(orders[0]["address"]["state"], "SP");

    let order = app.page(&target).await;
    assert!(order.contains("Pedido realizado com sucesso!"));
    assert!(order.contains("Vestido Midi"));
    assert!(app.page("/cart").await.contains("Seu carrinho está vazio."));
}

#[tokio::test]
async fn checkout_without_payment_method_rerenders() {
    let Shop { api, skirt, .. } = shop();
    let skirt_u = api.variant_ids(skirt)[0];
    let app = TestApp::spawn(api).await;
    app.login("ana@example.com", "segredo1").await;
    add(&app, skirt, skirt_u, 1).await;

    let response = app
        .post_form("/checkout", &[("address_id", "new"), ("payment_method", "CHEQUE")])
        .await;
    assert_eq!(response.status(), 200);
    assert!(response
        .text()
        .await
        .unwrap()
        .contains("Escolha uma forma de pagamento."));
    assert_eq!(app.api.request_count("POST", "/api/orders"), 0);
}
