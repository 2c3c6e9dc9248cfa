use mockall::mock;
use order_engine::{
    db_types::{NewOrder, Order, OrderId, OrderUpdate, Product, ProductId, UserId},
    order_objects::OrderQueryFilter,
    traits::{
        CheckoutGateway,
        CheckoutGatewayError,
        CheckoutRequest,
        DiscardResult,
        HostedSession,
        MarkPaidResult,
        OrderDetails,
        OrderManagement,
        OrderQueryError,
        PaymentGatewayDatabase,
        PaymentGatewayError,
    },
};

mock! {
    pub Store {}
    impl Clone for Store {
        fn clone(&self) -> Self;
    }
    impl PaymentGatewayDatabase for Store {
        fn url(&self) -> &str;
        async fn fetch_product(&self, product_id: &ProductId) -> Result<Option<Product>, PaymentGatewayError>;
        async fn insert_order(&self, order: NewOrder) -> Result<Order, PaymentGatewayError>;
        async fn update_order(&self, order_id: &OrderId, update: OrderUpdate) -> Result<Order, PaymentGatewayError>;
        async fn delete_order(&self, order_id: &OrderId) -> Result<Order, PaymentGatewayError>;
        async fn mark_order_paid(&self, order_id: &OrderId) -> Result<MarkPaidResult, PaymentGatewayError>;
        async fn discard_unpaid_order(&self, order_id: &OrderId) -> Result<DiscardResult, PaymentGatewayError>;
        async fn clear_cart(&self, user_id: &UserId) -> Result<bool, PaymentGatewayError>;
    }
    impl OrderManagement for Store {
        async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderQueryError>;
        async fn fetch_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderQueryError>;
        async fn fetch_order_details(&self, query: OrderQueryFilter) -> Result<Vec<OrderDetails>, OrderQueryError>;
    }
}

mock! {
    pub Gateway {}
    impl CheckoutGateway for Gateway {
        async fn create_checkout_session(&self, request: CheckoutRequest) -> Result<HostedSession, CheckoutGatewayError>;
        async fn list_sessions_by_payment_intent(&self, payment_intent: &str) -> Result<Vec<HostedSession>, CheckoutGatewayError>;
    }
}

/// What the store would return for a freshly inserted order.
pub fn stored(order: NewOrder) -> Order {
    Order {
        id: order.id,
        user_id: order.user_id,
        items: order.items,
        address_id: order.address_id,
        amount: order.amount,
        payment_type: order.payment_type,
        is_paid: false,
        created_at: order.created_at,
        updated_at: order.created_at,
    }
}
