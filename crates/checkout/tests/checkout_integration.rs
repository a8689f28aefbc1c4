//! End-to-end flows across cart, checkout, order lifecycle, and payment.

use checkout::{
    CartService, CheckoutOrchestrator, GatewayConfig, InMemoryCustomerDirectory, InMemoryGateway,
    OrderLifecycle, PaymentEngine,
};
use common::UserId;
use domain::{
    Address, CommerceError, Money, OrderStatus, PaymentMethod, PaymentStatus, Product,
};
use store::{CartStore, InMemoryCartStore, InMemoryCatalog, InMemoryOrderStore, InMemoryPaymentStore};

struct Storefront {
    carts: CartService<InMemoryCartStore, InMemoryCatalog>,
    checkout: CheckoutOrchestrator<
        InMemoryCartStore,
        InMemoryCatalog,
        InMemoryOrderStore,
        InMemoryCustomerDirectory,
    >,
    lifecycle: OrderLifecycle<InMemoryOrderStore, InMemoryCatalog>,
    payments: PaymentEngine<InMemoryPaymentStore, InMemoryOrderStore, InMemoryGateway>,
    catalog: InMemoryCatalog,
    gateway: InMemoryGateway,
    user_id: UserId,
}

impl Storefront {
    async fn new() -> Self {
        let cart_store = InMemoryCartStore::new();
        let catalog = InMemoryCatalog::new();
        let orders = InMemoryOrderStore::new();
        let payment_store = InMemoryPaymentStore::new();
        let customers = InMemoryCustomerDirectory::new();
        let gateway = InMemoryGateway::new();

        let user_id = UserId::new();
        customers.put(user_id, "Asha", "asha@example.com");

        catalog
            .put(Product::new("SOCK-001", "Wool Socks", Money::from_cents(1000), 10))
            .await;
        catalog
            .put(Product::new("SOCK-002", "Cotton Socks", Money::from_cents(250), 4))
            .await;

        Self {
            carts: CartService::new(cart_store.clone(), catalog.clone()),
            checkout: CheckoutOrchestrator::new(
                cart_store.clone(),
                catalog.clone(),
                orders.clone(),
                customers,
            ),
            lifecycle: OrderLifecycle::new(orders.clone(), catalog.clone()),
            payments: PaymentEngine::new(
                payment_store,
                orders,
                gateway.clone(),
                GatewayConfig::default(),
            ),
            catalog,
            gateway,
            user_id,
        }
    }

    fn address() -> Address {
        Address {
            street: "12 Market St".to_string(),
            city: "Kathmandu".to_string(),
            district: "Bagmati".to_string(),
            postal_code: "44600".to_string(),
            country: "NP".to_string(),
        }
    }
}

#[tokio::test]
async fn browse_checkout_pay_and_ship() {
    let store = Storefront::new().await;

    store
        .carts
        .add_line(store.user_id, "SOCK-001".into(), 2, Some("grey".into()), None)
        .await
        .unwrap();
    store
        .carts
        .add_line(store.user_id, "SOCK-002".into(), 1, None, Some("L".into()))
        .await
        .unwrap();

    let order = store
        .checkout
        .checkout(store.user_id, Storefront::address())
        .await
        .unwrap();
    assert_eq!(order.status(), OrderStatus::Pending);
    assert_eq!(order.total_amount().cents(), 2250);
    assert_eq!(store.catalog.available(&"SOCK-001".into()).await, Some(8));
    assert!(store.carts.get(store.user_id).await.unwrap().lines.is_empty());

    let initiation = store
        .payments
        .initiate(order.id(), PaymentMethod::Gateway, Money::from_cents(2250))
        .await
        .unwrap();
    assert!(initiation.payment_url.is_some());

    let outcome = store
        .payments
        .verify(order.id(), "GW-REF-7".to_string(), Money::from_cents(2250))
        .await
        .unwrap();
    assert_eq!(outcome.status, PaymentStatus::Completed);
    assert_eq!(
        store.lifecycle.get(order.id()).await.unwrap().status(),
        OrderStatus::Confirmed
    );

    store
        .lifecycle
        .update_status(order.id(), OrderStatus::Shipped)
        .await
        .unwrap();
    let delivered = store
        .lifecycle
        .update_status(order.id(), OrderStatus::Delivered)
        .await
        .unwrap();
    assert_eq!(delivered.status(), OrderStatus::Delivered);
}

#[tokio::test]
async fn cancellation_round_trip_restores_all_stock() {
    let store = Storefront::new().await;

    store
        .carts
        .add_line(store.user_id, "SOCK-001".into(), 3, None, None)
        .await
        .unwrap();
    store
        .carts
        .add_line(store.user_id, "SOCK-002".into(), 2, None, None)
        .await
        .unwrap();

    let order = store
        .checkout
        .checkout(store.user_id, Storefront::address())
        .await
        .unwrap();
    assert_eq!(store.catalog.available(&"SOCK-001".into()).await, Some(7));
    assert_eq!(store.catalog.available(&"SOCK-002".into()).await, Some(2));

    store
        .lifecycle
        .cancel_for_user(store.user_id, order.id())
        .await
        .unwrap();

    assert_eq!(store.catalog.available(&"SOCK-001".into()).await, Some(10));
    assert_eq!(store.catalog.available(&"SOCK-002".into()).await, Some(4));

    // Repeating the cancellation changes nothing.
    store
        .lifecycle
        .cancel_for_user(store.user_id, order.id())
        .await
        .unwrap();
    assert_eq!(store.catalog.available(&"SOCK-001".into()).await, Some(10));
}

#[tokio::test]
async fn failed_gateway_verification_keeps_the_order_pending() {
    let store = Storefront::new().await;

    store
        .carts
        .add_line(store.user_id, "SOCK-002".into(), 1, None, None)
        .await
        .unwrap();
    let order = store
        .checkout
        .checkout(store.user_id, Storefront::address())
        .await
        .unwrap();

    store
        .payments
        .initiate(order.id(), PaymentMethod::Gateway, Money::from_cents(250))
        .await
        .unwrap();
    store.gateway.set_reject("transaction not found");

    let outcome = store
        .payments
        .verify(order.id(), "GW-BOGUS".to_string(), Money::from_cents(250))
        .await
        .unwrap();

    assert_eq!(outcome.status, PaymentStatus::Failed);
    let order = store.lifecycle.get(order.id()).await.unwrap();
    assert_eq!(order.status(), OrderStatus::Pending);
    // The customer can still cancel and get the stock back.
    store
        .lifecycle
        .cancel_for_user(store.user_id, order.id())
        .await
        .unwrap();
    assert_eq!(store.catalog.available(&"SOCK-002".into()).await, Some(4));
}

#[tokio::test]
async fn oversubscribed_product_admits_only_available_stock() {
    let store = Storefront::new().await;

    // Five buyers race for four units of SOCK-002.
    let carts = InMemoryCartStore::new();
    let orders = InMemoryOrderStore::new();
    let customers = InMemoryCustomerDirectory::new();
    let racing = std::sync::Arc::new(CheckoutOrchestrator::new(
        carts.clone(),
        store.catalog.clone(),
        orders.clone(),
        customers.clone(),
    ));

    let mut joins = Vec::new();
    for _ in 0..5 {
        let user = UserId::new();
        customers.put(user, "Racer", "racer@example.com");
        let mut cart = carts.get_or_create(user).await;
        cart.add_line("SOCK-002".into(), 1, None, None).unwrap();
        carts.put(cart).await;

        let racing = racing.clone();
        joins.push(tokio::spawn(async move {
            racing.checkout(user, Storefront::address()).await
        }));
    }

    let mut successes = 0;
    let mut conflicts = 0;
    for join in joins {
        match join.await.unwrap() {
            Ok(_) => successes += 1,
            Err(CommerceError::InsufficientStock { .. }) => conflicts += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(successes, 4);
    assert_eq!(conflicts, 1);
    assert_eq!(store.catalog.available(&"SOCK-002".into()).await, Some(0));
    assert_eq!(orders.count().await, 4);
}
