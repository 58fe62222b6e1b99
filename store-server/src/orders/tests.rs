use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use shared::message::EventType;
use shared::models::{
    CancelOrderRequest, CreateOrderRequest, OrderItemInput, OrderListQuery, OrderStatus,
    PayingStatus, PaymentMethod, ProductCreate, PurchaseOrderRequest, RefundBank, RefundRequest,
    RefundStatus, ShippingAddress,
};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, RocksDb};

use super::OrderService;
use crate::auth::CurrentUser;
use crate::db::DbService;
use crate::db::repository::ProductRepository;
use crate::message::MessageBus;
use crate::payments::{
    PaymentError, PaymentGateway, PaymentGateways, PaymentLinkRequest, PaymentNotification,
};
use crate::utils::ErrorCode;

/// Test gateway: notifications are plain JSON, signature must be "valid"
#[derive(Debug)]
struct FakeGateway {
    method: PaymentMethod,
}

#[derive(Deserialize)]
struct FakeNotification {
    payment_ref: String,
    amount: i64,
    success: bool,
    signature: String,
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    fn method(&self) -> PaymentMethod {
        self.method
    }

    async fn create_payment_link(
        &self,
        request: &PaymentLinkRequest,
    ) -> Result<String, PaymentError> {
        Ok(format!("https://pay.test/{}", request.payment_ref))
    }

    fn parse_notification(&self, body: &[u8]) -> Result<PaymentNotification, PaymentError> {
        let n: FakeNotification =
            serde_json::from_slice(body).map_err(|e| PaymentError::Malformed(e.to_string()))?;
        if n.signature != "valid" {
            return Err(PaymentError::InvalidSignature);
        }
        Ok(PaymentNotification {
            payment_ref: n.payment_ref,
            amount: n.amount,
            success: n.success,
            transaction_id: Some("tx-1".into()),
            message: if n.success { "ok".into() } else { "declined".into() },
        })
    }
}

struct Fixture {
    _dir: tempfile::TempDir,
    db: Surreal<Db>,
    bus: MessageBus,
    service: OrderService,
    tea: String,
    coffee: String,
}

async fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let db: Surreal<Db> = Surreal::new::<RocksDb>(dir.path()).await.unwrap();
    let db = DbService::from_connection(db).await.unwrap().db;

    let products = ProductRepository::new(db.clone());
    let tea = products
        .create(
            ProductCreate {
                name: "Tea".into(),
                price: 20_000,
                is_active: None,
            },
            1,
        )
        .await
        .unwrap()
        .product_id;
    let coffee = products
        .create(
            ProductCreate {
                name: "Coffee".into(),
                price: 35_000,
                is_active: None,
            },
            1,
        )
        .await
        .unwrap()
        .product_id;

    let bus = MessageBus::with_capacity(64);
    let payments = PaymentGateways::new(
        Arc::new(FakeGateway {
            method: PaymentMethod::Momo,
        }),
        Arc::new(FakeGateway {
            method: PaymentMethod::PayOs,
        }),
    );
    let service = OrderService::new(db.clone(), bus.clone(), payments);

    Fixture {
        _dir: dir,
        db,
        bus,
        service,
        tea,
        coffee,
    }
}

fn alice() -> CurrentUser {
    CurrentUser::customer("alice")
}

fn create_req(number: &str, items: &[(&str, i64)]) -> CreateOrderRequest {
    CreateOrderRequest {
        order_number: number.into(),
        items: items
            .iter()
            .map(|(id, q)| OrderItemInput {
                product_id: id.to_string(),
                quantity: *q,
            })
            .collect(),
        shipping_address: None,
        payment_method: None,
        note: None,
    }
}

fn purchase_req(method: PaymentMethod) -> PurchaseOrderRequest {
    PurchaseOrderRequest {
        shipping_address: ShippingAddress {
            recipient_name: "Alice".into(),
            phone: "0900000000".into(),
            address: "1 Le Loi, District 1".into(),
        },
        payment_method: method,
        shipping_fee: 15_000,
        note: None,
    }
}

fn bank() -> RefundBank {
    RefundBank {
        bank_name: "Vietcombank".into(),
        account_number: "0123456789".into(),
        holder_name: "ALICE".into(),
    }
}

fn ipn(payment_ref: &str, amount: i64, success: bool, signature: &str) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "payment_ref": payment_ref,
        "amount": amount,
        "success": success,
        "signature": signature,
    }))
    .unwrap()
}

/// Draft → Pending with a non-cash method, plus a payment link
async fn pending_online_order(f: &Fixture, number: &str) -> String {
    let tea = f.tea.clone();
    f.service
        .create_order(&alice(), create_req(number, &[(&tea, 2)]))
        .await
        .unwrap();
    f.service
        .purchase_order(&alice(), number, purchase_req(PaymentMethod::Momo))
        .await
        .unwrap();
    f.service
        .create_payment_link(&alice(), number)
        .await
        .unwrap()
        .payment_ref
}

#[tokio::test]
async fn test_create_merges_lines_and_prices_items() {
    let f = fixture().await;
    let (order, updated) = f
        .service
        .create_order(
            &alice(),
            create_req("ORD-1", &[(&f.tea, 1), (&f.coffee, 1), (&f.tea, 2)]),
        )
        .await
        .unwrap();

    assert!(!updated);
    assert_eq!(order.status, OrderStatus::Draft);
    assert_eq!(order.items.len(), 2);
    assert_eq!(order.items[0].product_id, f.tea);
    assert_eq!(order.items[0].quantity, 3);
    assert_eq!(order.items[0].line_total, 60_000);
    assert_eq!(order.total_price, 95_000);
}

#[tokio::test]
async fn test_create_same_number_updates_in_place() {
    let f = fixture().await;
    let (first, _) = f
        .service
        .create_order(&alice(), create_req("ORD-1", &[(&f.tea, 1)]))
        .await
        .unwrap();
    let (second, updated) = f
        .service
        .create_order(&alice(), create_req("ORD-1", &[(&f.coffee, 2)]))
        .await
        .unwrap();

    assert!(updated);
    assert_eq!(first.order_id, second.order_id);
    assert_eq!(second.total_price, 70_000);

    let page = f
        .service
        .list_orders(&alice(), OrderListQuery::default())
        .await
        .unwrap();
    assert_eq!(page.total, 1);
}

#[tokio::test]
async fn test_create_validation() {
    let f = fixture().await;

    let err = f
        .service
        .create_order(&alice(), create_req("ORD-1", &[]))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::OrderEmpty);

    let err = f
        .service
        .create_order(&alice(), create_req("  ", &[(&f.tea, 1)]))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::RequiredField);

    let err = f
        .service
        .create_order(&alice(), create_req("ORD-1", &[(&f.tea, 0)]))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationFailed);

    let err = f
        .service
        .create_order(&alice(), create_req("ORD-1", &[("nope", 1)]))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ProductNotFound);
}

#[tokio::test]
async fn test_create_rejects_other_users_order_and_non_draft() {
    let f = fixture().await;
    f.service
        .create_order(&alice(), create_req("ORD-1", &[(&f.tea, 1)]))
        .await
        .unwrap();

    let err = f
        .service
        .create_order(&CurrentUser::customer("bob"), create_req("ORD-1", &[(&f.tea, 1)]))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::PermissionDenied);

    f.service
        .purchase_order(&alice(), "ORD-1", purchase_req(PaymentMethod::CashOnDelivery))
        .await
        .unwrap();
    let err = f
        .service
        .create_order(&alice(), create_req("ORD-1", &[(&f.tea, 1)]))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::OrderNotDraft);
}

#[tokio::test]
async fn test_purchase_unknown_order_is_not_found() {
    let f = fixture().await;
    let err = f
        .service
        .purchase_order(&alice(), "missing", purchase_req(PaymentMethod::Momo))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::OrderNotFound);
    assert_eq!(err.http_status(), http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_purchase_cash_marks_paid() {
    let f = fixture().await;
    f.service
        .create_order(&alice(), create_req("ORD-1", &[(&f.tea, 1)]))
        .await
        .unwrap();
    let order = f
        .service
        .purchase_order(&alice(), "ORD-1", purchase_req(PaymentMethod::CashOnDelivery))
        .await
        .unwrap();

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.paying_status, PayingStatus::Paid);
    assert_eq!(order.total_price, 35_000);
    assert!(order.paid_at.is_some());

    let err = f
        .service
        .purchase_order(&alice(), "ORD-1", purchase_req(PaymentMethod::CashOnDelivery))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::OrderNotDraft);
}

#[tokio::test]
async fn test_online_payment_flow() {
    let f = fixture().await;
    let mut rx = f.bus.subscribe();
    let payment_ref = pending_online_order(&f, "ORD-1").await;

    let order = f.service.get_order(&alice(), "ORD-1").await.unwrap();
    assert_eq!(order.paying_status, PayingStatus::Unpaid);
    assert_eq!(order.payment_ref.as_deref(), Some(payment_ref.as_str()));

    // bad signature leaves the order untouched
    let err = f
        .service
        .confirm_payment(PaymentMethod::Momo, &ipn(&payment_ref, 55_000, true, "forged"))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::PaymentSignatureInvalid);
    let unchanged = f.service.get_order(&alice(), "ORD-1").await.unwrap();
    assert_eq!(unchanged, order);

    // wrong amount
    let err = f
        .service
        .confirm_payment(PaymentMethod::Momo, &ipn(&payment_ref, 1, true, "valid"))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::PaymentAmountMismatch);

    let paid = f
        .service
        .confirm_payment(PaymentMethod::Momo, &ipn(&payment_ref, 55_000, true, "valid"))
        .await
        .unwrap();
    assert_eq!(paid.paying_status, PayingStatus::Paid);

    // duplicate IPN is acknowledged without change
    let again = f
        .service
        .confirm_payment(PaymentMethod::Momo, &ipn(&payment_ref, 55_000, true, "valid"))
        .await
        .unwrap();
    assert_eq!(again, paid);

    let mut events = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        events.push(msg.event_type);
    }
    assert_eq!(
        events,
        vec![
            EventType::OrderCreated,
            EventType::OrderPurchased,
            EventType::PaymentStatusChanged
        ]
    );
}

#[tokio::test]
async fn test_failed_payment_then_new_link() {
    let f = fixture().await;
    let payment_ref = pending_online_order(&f, "ORD-1").await;

    let failed = f
        .service
        .confirm_payment(PaymentMethod::Momo, &ipn(&payment_ref, 55_000, false, "valid"))
        .await
        .unwrap();
    assert_eq!(failed.paying_status, PayingStatus::Failed);

    let link = f.service.create_payment_link(&alice(), "ORD-1").await.unwrap();
    assert_ne!(link.payment_ref, payment_ref);
    assert_eq!(link.checkout_url, format!("https://pay.test/{}", link.payment_ref));
    let order = f.service.get_order(&alice(), "ORD-1").await.unwrap();
    assert_eq!(order.paying_status, PayingStatus::Unpaid);
}

#[tokio::test]
async fn test_payment_link_rejected_for_cash() {
    let f = fixture().await;
    f.service
        .create_order(&alice(), create_req("ORD-1", &[(&f.tea, 1)]))
        .await
        .unwrap();
    let err = f
        .service
        .create_payment_link(&alice(), "ORD-1")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::OrderNotPayable);

    f.service
        .purchase_order(&alice(), "ORD-1", purchase_req(PaymentMethod::CashOnDelivery))
        .await
        .unwrap();
    let err = f
        .service
        .create_payment_link(&alice(), "ORD-1")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::OrderAlreadyPaid);
}

#[tokio::test]
async fn test_cancel_window() {
    let f = fixture().await;
    f.service
        .create_order(&alice(), create_req("ORD-1", &[(&f.tea, 1)]))
        .await
        .unwrap();
    f.service
        .update_order_status("ORD-1", "Confirmed")
        .await
        .unwrap();

    let err = f
        .service
        .cancel_order(&alice(), "ORD-1", CancelOrderRequest::default())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::OrderNotCancellable);
    assert_eq!(err.http_status(), http::StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_cancel_paid_online_order_flags_refund() {
    let f = fixture().await;
    let payment_ref = pending_online_order(&f, "ORD-1").await;
    f.service
        .confirm_payment(PaymentMethod::Momo, &ipn(&payment_ref, 55_000, true, "valid"))
        .await
        .unwrap();

    let order = f
        .service
        .cancel_order(
            &alice(),
            "ORD-1",
            CancelOrderRequest {
                reason: Some("Ordered twice".into()),
                refund_bank: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
    assert!(order.requires_refund);
    assert_eq!(order.refund_status, RefundStatus::NotInitiated);

    let order = f
        .service
        .request_refund(&alice(), "ORD-1", RefundRequest { refund_bank: bank() })
        .await
        .unwrap();
    assert_eq!(order.refund_status, RefundStatus::Pending);
    assert_eq!(order.refund_bank, Some(bank()));

    let err = f
        .service
        .request_refund(&alice(), "ORD-1", RefundRequest { refund_bank: bank() })
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::RefundNotAllowed);
}

#[tokio::test]
async fn test_cancel_with_bank_moves_refund_pending() {
    let f = fixture().await;
    let payment_ref = pending_online_order(&f, "ORD-1").await;
    f.service
        .confirm_payment(PaymentMethod::Momo, &ipn(&payment_ref, 55_000, true, "valid"))
        .await
        .unwrap();

    let order = f
        .service
        .cancel_order(
            &alice(),
            "ORD-1",
            CancelOrderRequest {
                reason: None,
                refund_bank: Some(bank()),
            },
        )
        .await
        .unwrap();
    assert!(order.requires_refund);
    assert_eq!(order.refund_status, RefundStatus::Pending);
}

#[tokio::test]
async fn test_refund_not_allowed_for_cash_cancel() {
    let f = fixture().await;
    f.service
        .create_order(&alice(), create_req("ORD-1", &[(&f.tea, 1)]))
        .await
        .unwrap();
    f.service
        .purchase_order(&alice(), "ORD-1", purchase_req(PaymentMethod::CashOnDelivery))
        .await
        .unwrap();
    let order = f
        .service
        .cancel_order(&alice(), "ORD-1", CancelOrderRequest::default())
        .await
        .unwrap();
    assert!(!order.requires_refund);

    let err = f
        .service
        .request_refund(&alice(), "ORD-1", RefundRequest { refund_bank: bank() })
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::RefundNotAllowed);
}

#[tokio::test]
async fn test_cancel_unpaid_online_order_flags_refund() {
    let f = fixture().await;
    pending_online_order(&f, "ORD-1").await;
    let order = f
        .service
        .cancel_order(&alice(), "ORD-1", CancelOrderRequest::default())
        .await
        .unwrap();
    assert_eq!(order.paying_status, PayingStatus::Unpaid);
    assert!(order.requires_refund);
    assert_eq!(order.refund_status, RefundStatus::NotInitiated);
}

#[tokio::test]
async fn test_payment_after_cancel_keeps_refund_path() {
    let f = fixture().await;
    let payment_ref = pending_online_order(&f, "ORD-1").await;
    f.service
        .cancel_order(&alice(), "ORD-1", CancelOrderRequest::default())
        .await
        .unwrap();

    // the checkout link issued before cancelling is still paid by the customer
    let order = f
        .service
        .confirm_payment(PaymentMethod::Momo, &ipn(&payment_ref, 55_000, true, "valid"))
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
    assert_eq!(order.paying_status, PayingStatus::Paid);
    assert!(order.requires_refund);

    let order = f
        .service
        .request_refund(&alice(), "ORD-1", RefundRequest { refund_bank: bank() })
        .await
        .unwrap();
    assert_eq!(order.refund_status, RefundStatus::Pending);
}

#[tokio::test]
async fn test_monetary_input_bounds() {
    let f = fixture().await;
    f.service
        .create_order(&alice(), create_req("ORD-1", &[(&f.tea, 1)]))
        .await
        .unwrap();

    let mut req = purchase_req(PaymentMethod::CashOnDelivery);
    req.shipping_fee = i64::MAX;
    let err = f
        .service
        .purchase_order(&alice(), "ORD-1", req)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValueOutOfRange);
    assert_eq!(err.http_status(), http::StatusCode::BAD_REQUEST);
    let order = f.service.get_order(&alice(), "ORD-1").await.unwrap();
    assert_eq!(order.status, OrderStatus::Draft);
    assert_eq!(order.total_price, 20_000);

    // merged duplicate lines are bounded like a single line
    let err = f
        .service
        .create_order(&alice(), create_req("ORD-2", &[(&f.tea, 5_000), (&f.tea, 5_000)]))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValueOutOfRange);

    // stored prices beyond the API limit must not wrap around
    let huge = ProductRepository::new(f.db.clone())
        .create(
            ProductCreate {
                name: "Gold".into(),
                price: i64::MAX / 2,
                is_active: None,
            },
            1,
        )
        .await
        .unwrap()
        .product_id;
    let err = f
        .service
        .create_order(&alice(), create_req("ORD-3", &[(&huge, 3)]))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValueOutOfRange);
}

#[tokio::test]
async fn test_concurrent_create_same_number() {
    let f = fixture().await;
    let (a, b) = tokio::join!(
        f.service
            .create_order(&alice(), create_req("ORD-1", &[(&f.tea, 1)])),
        f.service
            .create_order(&alice(), create_req("ORD-1", &[(&f.tea, 2)])),
    );
    let (a, a_updated) = a.unwrap();
    let (b, b_updated) = b.unwrap();

    assert_eq!(a.order_id, b.order_id);
    assert!(a_updated != b_updated, "exactly one create must insert");

    let page = f
        .service
        .list_orders(&alice(), OrderListQuery::default())
        .await
        .unwrap();
    assert_eq!(page.total, 1);
}

#[tokio::test]
async fn test_admin_setters_validate_enum_values() {
    let f = fixture().await;
    f.service
        .create_order(&alice(), create_req("ORD-1", &[(&f.tea, 1)]))
        .await
        .unwrap();

    let err = f
        .service
        .update_order_status("ORD-1", "Shipped")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidOrderStatus);
    assert_eq!(err.http_status(), http::StatusCode::BAD_REQUEST);
    for v in OrderStatus::ALL {
        assert!(err.message.contains(v));
    }

    let err = f
        .service
        .update_payment_status("ORD-1", "Refunded")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidPaymentStatus);

    let err = f
        .service
        .update_refund_status("ORD-1", "Done")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidRefundStatus);

    let order = f
        .service
        .update_order_status("ORD-1", "Delivered")
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Delivered);
    assert!(order.delivered_at.is_some());

    let order = f
        .service
        .update_payment_status("ORD-1", "Paid")
        .await
        .unwrap();
    assert!(order.paid_at.is_some());

    // no transition table: backwards moves are applied
    let order = f
        .service
        .update_refund_status("ORD-1", "Completed")
        .await
        .unwrap();
    assert_eq!(order.refund_status, RefundStatus::Completed);
    let order = f
        .service
        .update_refund_status("ORD-1", "Pending")
        .await
        .unwrap();
    assert_eq!(order.refund_status, RefundStatus::Pending);
}

#[tokio::test]
async fn test_admin_cancel_flags_refund() {
    let f = fixture().await;
    let payment_ref = pending_online_order(&f, "ORD-1").await;
    f.service
        .confirm_payment(PaymentMethod::Momo, &ipn(&payment_ref, 55_000, true, "valid"))
        .await
        .unwrap();
    f.service
        .update_order_status("ORD-1", "Confirmed")
        .await
        .unwrap();

    let order = f
        .service
        .update_order_status("ORD-1", "CancelledByAdmin")
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::CancelledByAdmin);
    assert!(order.requires_refund);
    assert!(order.cancelled_at.is_some());
}

#[tokio::test]
async fn test_read_access_and_listing() {
    let f = fixture().await;
    let bob = CurrentUser::customer("bob");
    for n in ["A-1", "A-2", "A-3"] {
        f.service
            .create_order(&alice(), create_req(n, &[(&f.tea, 1)]))
            .await
            .unwrap();
    }
    f.service
        .create_order(&bob, create_req("B-1", &[(&f.coffee, 1)]))
        .await
        .unwrap();

    let err = f.service.get_order(&bob, "A-1").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::PermissionDenied);
    assert!(
        f.service
            .get_order(&CurrentUser::admin("root"), "A-1")
            .await
            .is_ok()
    );

    let page = f
        .service
        .list_orders(
            &alice(),
            OrderListQuery {
                limit: Some(2),
                offset: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.orders.len(), 2);
    assert!(page.orders.iter().all(|o| o.user_id == "alice"));

    let page = f
        .service
        .list_orders(&CurrentUser::admin("root"), OrderListQuery::default())
        .await
        .unwrap();
    assert_eq!(page.total, 4);
    assert_eq!(page.limit, 20);

    let err = f
        .service
        .list_orders(
            &bob,
            OrderListQuery {
                user_id: Some("alice".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::PermissionDenied);

    let err = f
        .service
        .list_orders(
            &alice(),
            OrderListQuery {
                status: Some("pending".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidOrderStatus);
}

#[tokio::test]
async fn test_reports_over_stored_orders() {
    let f = fixture().await;
    let payment_ref = pending_online_order(&f, "ORD-1").await;
    f.service
        .confirm_payment(PaymentMethod::Momo, &ipn(&payment_ref, 55_000, true, "valid"))
        .await
        .unwrap();
    f.service
        .create_order(&alice(), create_req("ORD-2", &[(&f.coffee, 1)]))
        .await
        .unwrap();

    let revenue = f
        .service
        .revenue_report(shared::models::ReportPeriod::Day)
        .await
        .unwrap();
    assert_eq!(revenue.current, 55_000);
    assert_eq!(revenue.previous, 0);
    assert_eq!(revenue.change_percent, None);

    let counts = f
        .service
        .order_report(shared::models::ReportPeriod::Week)
        .await
        .unwrap();
    assert_eq!(counts.current, 1);

    let top = f.service.top_ordered_products(10).await.unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].product_id, f.tea);
    assert_eq!(top[0].quantity, 2);

    ProductRepository::new(f.db.clone())
        .add_rating(&f.coffee, 4, 2)
        .await
        .unwrap();
    let rated = f.service.top_rated_products(10).await.unwrap();
    assert_eq!(rated.len(), 1);
    assert_eq!(rated[0].product_id, f.coffee);
}
