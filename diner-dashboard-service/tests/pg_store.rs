use bigdecimal::BigDecimal;
use diner_dashboard_service::{
    config::Config,
    models::{NewCategory, NewMenuItem, NewOrder, NewOrderLine, OrderStatus},
    run_migrations,
    service::DashboardService,
    store::{PgStore, RestaurantStore, StoreError},
};
use uuid::Uuid;

async fn service() -> DashboardService<PgStore> {
    let config = Config::from_env().expect("DATABASE_URL must be set");
    let store = PgStore::new(config.database_url);
    run_migrations(&store).await.unwrap();
    DashboardService::new(store)
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database at DATABASE_URL"]
async fn test_order_round_trip() {
    let service = service().await;

    let category = service
        .add_category(NewCategory {
            name: format!("Specials {}", Uuid::new_v4()),
            description: None,
        })
        .await
        .unwrap();
    assert_eq!(category.created_at, category.updated_at);

    let item = service
        .add_menu_item(NewMenuItem {
            category_id: category.id,
            name: "Soup of the day".to_string(),
            description: None,
            price: "6.25".parse().unwrap(),
            image_url: None,
            is_available: None,
        })
        .await
        .unwrap();

    let order = service
        .create_order(NewOrder {
            customer_name: Some("Ada".to_string()),
            customer_phone: None,
            status: None,
            order_type: None,
            items: vec![NewOrderLine {
                menu_item_id: item.id,
                quantity: 2,
            }],
        })
        .await
        .unwrap();
    assert_eq!(order.total_amount, "12.50".parse::<BigDecimal>().unwrap());
    assert_eq!(order.status, OrderStatus::Pending);

    let orders = service.list_orders(Some(OrderStatus::Pending)).await.unwrap();
    let stored = orders.iter().find(|o| o.order.id == order.id).unwrap();
    assert_eq!(stored.items.len(), 1);
    assert_eq!(stored.items[0].menu_item.as_ref().unwrap().id, item.id);

    let result = service.delete_category(category.id).await;
    assert!(result.is_err());

    service.delete_order(order.id).await.unwrap();
    service.delete_menu_item(item.id).await.unwrap();
    service.delete_category(category.id).await.unwrap();

    assert!(matches!(
        service.store().delete_order(order.id).await,
        Err(StoreError::NotFound)
    ));
}
