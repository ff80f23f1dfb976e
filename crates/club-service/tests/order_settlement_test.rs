//! OrderService 集成测试
//!
//! 使用真实 PostgreSQL 验证订单流水线：创建 -> 员工确认 -> 结算。
//! 结算在单个事务内完成扣款、扣库存与状态迁移，测试重点覆盖
//! 原子性（失败不留半账）与幂等性（重复结算绝不二次扣款）。
//!
//! ## 运行方式
//!
//! ```bash
//! DATABASE_URL=postgres://... cargo test --test order_settlement_test -- --ignored
//! ```

use club_commerce::error::CommerceError;
use club_commerce::repository::{
    LedgerRepository, OrderRepository, ProductRepository, WalletRepository,
};
use club_commerce::service::{OrderService, SettleOutcome, WalletService};
use club_commerce::models::OrderStatus;
use club_commerce::worker::ReconciliationWorker;
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::sync::Arc;

// ==================== 辅助函数 ====================

fn database_url() -> String {
    std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests")
}

async fn connect_pool() -> PgPool {
    let pool = PgPool::connect(&database_url()).await.unwrap();
    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .expect("执行迁移失败");
    pool
}

fn setup_order_service(pool: &PgPool) -> OrderService {
    OrderService::new(
        Arc::new(OrderRepository::new(pool.clone())),
        Arc::new(ProductRepository::new(pool.clone())),
        Arc::new(WalletRepository::new(pool.clone())),
        pool.clone(),
    )
}

fn setup_wallet_service(pool: &PgPool) -> WalletService {
    WalletService::new(
        Arc::new(WalletRepository::new(pool.clone())),
        Arc::new(LedgerRepository::new(pool.clone())),
        pool.clone(),
    )
}

/// 插入测试商品并重置库存（幂等）
async fn seed_product(pool: &PgPool, product_id: i64, name: &str, price: Decimal, stock: i32) {
    sqlx::query(
        r#"
        INSERT INTO products (id, name, price, stock, category)
        VALUES ($1, $2, $3, $4, 'integration')
        ON CONFLICT (id) DO UPDATE SET
            name = EXCLUDED.name,
            price = EXCLUDED.price,
            stock = EXCLUDED.stock
        "#,
    )
    .bind(product_id)
    .bind(name)
    .bind(price)
    .bind(stock)
    .execute(pool)
    .await
    .expect("插入测试商品失败");
}

/// 插入测试钱包并重置余额（幂等）
async fn seed_wallet(pool: &PgPool, owner_id: &str, balance: Decimal) {
    sqlx::query(
        r#"
        INSERT INTO wallets (owner_id, balance)
        VALUES ($1, $2)
        ON CONFLICT (owner_id) DO UPDATE SET balance = EXCLUDED.balance
        "#,
    )
    .bind(owner_id)
    .bind(balance)
    .execute(pool)
    .await
    .expect("插入测试钱包失败");
}

/// 清理测试数据，按外键依赖顺序删除
async fn cleanup_test_data(pool: &PgPool, owner_ids: &[&str], product_ids: &[i64]) {
    // 订单行随订单级联删除
    for oid in owner_ids {
        sqlx::query("DELETE FROM orders WHERE owner_id = $1")
            .bind(oid)
            .execute(pool)
            .await
            .ok();
        sqlx::query("DELETE FROM ledger_entries WHERE owner_id = $1")
            .bind(oid)
            .execute(pool)
            .await
            .ok();
        sqlx::query("DELETE FROM wallets WHERE owner_id = $1")
            .bind(oid)
            .execute(pool)
            .await
            .ok();
    }
    for pid in product_ids {
        sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(pid)
            .execute(pool)
            .await
            .ok();
    }
}

/// 查询用户当前余额
async fn get_balance(pool: &PgPool, owner_id: &str) -> Decimal {
    sqlx::query_scalar::<_, Decimal>("SELECT balance FROM wallets WHERE owner_id = $1")
        .bind(owner_id)
        .fetch_one(pool)
        .await
        .expect("查询余额失败")
}

/// 查询商品当前库存
async fn get_stock(pool: &PgPool, product_id: i64) -> i32 {
    sqlx::query_scalar::<_, i32>("SELECT stock FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_one(pool)
        .await
        .expect("查询库存失败")
}

/// 统计用户的购买扣款流水条数
async fn count_purchase_debits(pool: &PgPool, owner_id: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM ledger_entries \
         WHERE owner_id = $1 AND kind = 'debit' AND description LIKE 'Store purchase:%'",
    )
    .bind(owner_id)
    .fetch_one(pool)
    .await
    .expect("统计流水失败")
}

// ==================== 测试用例 ====================

/// 创建订单：前置校验通过后订单为 Pending / 未确认，金额等于商品价格
#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn test_create_order_pending_unapproved() {
    let pool = connect_pool().await;
    let product_id = 94001;
    let owner_id = "integ_order_create_001";
    cleanup_test_data(&pool, &[owner_id], &[product_id]).await;
    seed_product(&pool, product_id, "Protein Bar", Decimal::new(450, 2), 10).await;
    seed_wallet(&pool, owner_id, Decimal::new(10000, 2)).await;

    let svc = setup_order_service(&pool);
    let order = svc.create(owner_id, product_id).await.expect("下单应成功");

    assert_eq!(order.status, OrderStatus::Pending);
    assert!(!order.approved, "新订单不应已确认");
    assert_eq!(order.total, Decimal::new(450, 2), "订单金额应等于商品价格");

    // 下单阶段既不扣款也不扣库存
    assert_eq!(get_balance(&pool, owner_id).await, Decimal::new(10000, 2));
    assert_eq!(get_stock(&pool, product_id).await, 10);

    cleanup_test_data(&pool, &[owner_id], &[product_id]).await;
}

/// 余额不够时下单被前置拒绝，不留下任何订单记录
#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn test_create_order_insufficient_funds_leaves_no_row() {
    let pool = connect_pool().await;
    let product_id = 94002;
    let owner_id = "integ_order_poor_001";
    cleanup_test_data(&pool, &[owner_id], &[product_id]).await;
    seed_product(&pool, product_id, "Premium Supplement", Decimal::new(8000, 2), 5).await;
    seed_wallet(&pool, owner_id, Decimal::new(1000, 2)).await;

    let svc = setup_order_service(&pool);
    let result = svc.create(owner_id, product_id).await;

    match result.unwrap_err() {
        CommerceError::InsufficientFunds {
            required,
            available,
        } => {
            assert_eq!(required, Decimal::new(8000, 2));
            assert_eq!(available, Decimal::new(1000, 2));
        }
        other => panic!("应返回 InsufficientFunds，实际: {:?}", other),
    }

    let orders = svc.list_for_owner(owner_id, 10).await.unwrap();
    assert!(orders.is_empty(), "被拒绝的下单不应留下订单记录");

    cleanup_test_data(&pool, &[owner_id], &[product_id]).await;
}

/// 缺货商品下单应返回 OutOfStock
#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn test_create_order_out_of_stock() {
    let pool = connect_pool().await;
    let product_id = 94003;
    let owner_id = "integ_order_oos_001";
    cleanup_test_data(&pool, &[owner_id], &[product_id]).await;
    seed_product(&pool, product_id, "Sold Out Towel", Decimal::new(1500, 2), 0).await;
    seed_wallet(&pool, owner_id, Decimal::new(10000, 2)).await;

    let svc = setup_order_service(&pool);
    let result = svc.create(owner_id, product_id).await;

    assert!(
        matches!(result.unwrap_err(), CommerceError::OutOfStock(id) if id == product_id),
        "缺货商品应返回 OutOfStock",
    );

    cleanup_test_data(&pool, &[owner_id], &[product_id]).await;
}

/// 不存在的商品下单应返回 ProductNotFound
#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn test_create_order_missing_product() {
    let pool = connect_pool().await;
    let owner_id = "integ_order_noprod_001";
    cleanup_test_data(&pool, &[owner_id], &[]).await;
    seed_wallet(&pool, owner_id, Decimal::new(10000, 2)).await;

    let svc = setup_order_service(&pool);
    let result = svc.create(owner_id, 999_999).await;

    assert!(
        matches!(result.unwrap_err(), CommerceError::ProductNotFound(999_999)),
        "不存在的商品应返回 ProductNotFound",
    );

    cleanup_test_data(&pool, &[owner_id], &[]).await;
}

/// 结算成功路径：钱包 100 -> 20，库存 1 -> 0，恰好一条购买流水，订单 Completed
#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn test_settle_happy_path() {
    let pool = connect_pool().await;
    let product_id = 94005;
    let owner_id = "integ_order_settle_001";
    cleanup_test_data(&pool, &[owner_id], &[product_id]).await;
    seed_product(&pool, product_id, "Club Hoodie", Decimal::new(8000, 2), 1).await;
    seed_wallet(&pool, owner_id, Decimal::new(10000, 2)).await;

    let svc = setup_order_service(&pool);
    let order = svc.create(owner_id, product_id).await.unwrap();
    svc.mark_approved(order.id).await.unwrap();

    let outcome = svc.settle(order.id).await.expect("结算应成功");
    assert_eq!(outcome, SettleOutcome::Completed);

    assert_eq!(get_balance(&pool, owner_id).await, Decimal::new(2000, 2), "余额应为 20.00");
    assert_eq!(get_stock(&pool, product_id).await, 0, "库存应扣减到 0");
    assert_eq!(count_purchase_debits(&pool, owner_id).await, 1, "应恰好一条购买流水");

    let settled = svc.get(order.id).await.unwrap().unwrap();
    assert_eq!(settled.status, OrderStatus::Completed);

    // 流水描述携带商品名
    let description: String = sqlx::query_scalar(
        "SELECT description FROM ledger_entries WHERE owner_id = $1 AND kind = 'debit'",
    )
    .bind(owner_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(description, "Store purchase: Club Hoodie");

    cleanup_test_data(&pool, &[owner_id], &[product_id]).await;
}

/// 结算幂等：对已完成订单重复结算返回 AlreadySettled，绝不二次扣款
#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn test_settle_idempotent() {
    let pool = connect_pool().await;
    let product_id = 94006;
    let owner_id = "integ_order_idem_001";
    cleanup_test_data(&pool, &[owner_id], &[product_id]).await;
    seed_product(&pool, product_id, "Shaker Bottle", Decimal::new(1200, 2), 5).await;
    seed_wallet(&pool, owner_id, Decimal::new(5000, 2)).await;

    let svc = setup_order_service(&pool);
    let order = svc.create(owner_id, product_id).await.unwrap();
    svc.mark_approved(order.id).await.unwrap();

    let first = svc.settle(order.id).await.unwrap();
    assert_eq!(first, SettleOutcome::Completed);

    let second = svc.settle(order.id).await.unwrap();
    assert_eq!(second, SettleOutcome::AlreadySettled, "重复结算应为无操作");

    assert_eq!(get_balance(&pool, owner_id).await, Decimal::new(3800, 2), "只应扣款一次");
    assert_eq!(get_stock(&pool, product_id).await, 4, "只应扣库存一次");
    assert_eq!(count_purchase_debits(&pool, owner_id).await, 1, "只应有一条购买流水");

    cleanup_test_data(&pool, &[owner_id], &[product_id]).await;
}

/// 下单后钱包被掏空：结算失败，订单进入 Error 终态，不留半账
#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn test_settle_drained_wallet_marks_error() {
    let pool = connect_pool().await;
    let product_id = 94007;
    let owner_id = "integ_order_drained_001";
    cleanup_test_data(&pool, &[owner_id], &[product_id]).await;
    seed_product(&pool, product_id, "Gym Bag", Decimal::new(6000, 2), 3).await;
    seed_wallet(&pool, owner_id, Decimal::new(10000, 2)).await;

    let order_svc = setup_order_service(&pool);
    let wallet_svc = setup_wallet_service(&pool);

    // 下单时余额充足（advisory 检查通过）
    let order = order_svc.create(owner_id, product_id).await.unwrap();
    order_svc.mark_approved(order.id).await.unwrap();

    // 结算前余额被其他消费掏空
    wallet_svc
        .debit(owner_id, Decimal::new(9500, 2), "Cafe spending spree")
        .await
        .unwrap();

    let result = order_svc.settle(order.id).await;
    assert!(
        matches!(result.unwrap_err(), CommerceError::InsufficientFunds { .. }),
        "余额不足应导致结算失败",
    );

    // 订单进入 Error 终态
    let errored = order_svc.get(order.id).await.unwrap().unwrap();
    assert_eq!(errored.status, OrderStatus::Error);

    // 失败的结算不留半账：余额未动，库存未动，无购买流水
    assert_eq!(get_balance(&pool, owner_id).await, Decimal::new(500, 2));
    assert_eq!(get_stock(&pool, product_id).await, 3);
    assert_eq!(count_purchase_debits(&pool, owner_id).await, 0);

    // Error 是终态：重试不会复活订单
    let retry = order_svc.settle(order.id).await.unwrap();
    assert_eq!(retry, SettleOutcome::AlreadySettled);

    cleanup_test_data(&pool, &[owner_id], &[product_id]).await;
}

/// 结算不存在的订单返回 Missing
#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn test_settle_missing_order() {
    let pool = connect_pool().await;
    let svc = setup_order_service(&pool);

    let outcome = svc.settle(999_999_999).await.unwrap();
    assert_eq!(outcome, SettleOutcome::Missing);
}

/// 确认不存在的订单返回 OrderNotFound
#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn test_mark_approved_missing_order() {
    let pool = connect_pool().await;
    let svc = setup_order_service(&pool);

    let result = svc.mark_approved(999_999_999).await;
    assert!(
        matches!(result.unwrap_err(), CommerceError::OrderNotFound(_)),
        "不存在的订单应返回 OrderNotFound",
    );
}

/// 对账扫描只结算已确认订单，未确认订单保持 Pending
#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn test_sweep_settles_only_approved() {
    let pool = connect_pool().await;
    let product_id = 94008;
    let approved_owner = "integ_order_sweep_a_001";
    let unapproved_owner = "integ_order_sweep_b_001";
    cleanup_test_data(&pool, &[approved_owner, unapproved_owner], &[product_id]).await;
    seed_product(&pool, product_id, "Water Bottle", Decimal::new(900, 2), 10).await;
    seed_wallet(&pool, approved_owner, Decimal::new(5000, 2)).await;
    seed_wallet(&pool, unapproved_owner, Decimal::new(5000, 2)).await;

    let svc = setup_order_service(&pool);
    let approved = svc.create(approved_owner, product_id).await.unwrap();
    let unapproved = svc.create(unapproved_owner, product_id).await.unwrap();
    svc.mark_approved(approved.id).await.unwrap();

    let stats = svc.sweep(100).await.unwrap();
    assert!(stats.settled >= 1, "已确认订单应被本轮结算");

    let settled = svc.get(approved.id).await.unwrap().unwrap();
    assert_eq!(settled.status, OrderStatus::Completed);
    assert_eq!(get_balance(&pool, approved_owner).await, Decimal::new(4100, 2));

    let untouched = svc.get(unapproved.id).await.unwrap().unwrap();
    assert_eq!(untouched.status, OrderStatus::Pending, "未确认订单不在扫描范围");
    assert_eq!(get_balance(&pool, unapproved_owner).await, Decimal::new(5000, 2));

    cleanup_test_data(&pool, &[approved_owner, unapproved_owner], &[product_id]).await;
}

/// 对账扫描的故障隔离：坏订单计入 errored 并终态化，好订单照常结算
#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn test_sweep_isolates_failures() {
    let pool = connect_pool().await;
    let product_id = 94009;
    let good_owner = "integ_order_mix_good_001";
    let bad_owner = "integ_order_mix_bad_001";
    cleanup_test_data(&pool, &[good_owner, bad_owner], &[product_id]).await;
    seed_product(&pool, product_id, "Resistance Band", Decimal::new(2500, 2), 10).await;
    seed_wallet(&pool, good_owner, Decimal::new(5000, 2)).await;
    seed_wallet(&pool, bad_owner, Decimal::new(5000, 2)).await;

    let svc = setup_order_service(&pool);
    let wallet_svc = setup_wallet_service(&pool);

    let good = svc.create(good_owner, product_id).await.unwrap();
    let bad = svc.create(bad_owner, product_id).await.unwrap();
    svc.mark_approved(good.id).await.unwrap();
    svc.mark_approved(bad.id).await.unwrap();

    // 坏订单的钱包在结算前被掏空
    wallet_svc
        .debit(bad_owner, Decimal::new(4000, 2), "drain")
        .await
        .unwrap();

    let stats = svc.sweep(100).await.unwrap();
    assert!(stats.settled >= 1, "好订单应结算成功");
    assert!(stats.errored >= 1, "坏订单应计入 errored");

    assert_eq!(
        svc.get(good.id).await.unwrap().unwrap().status,
        OrderStatus::Completed,
    );
    assert_eq!(
        svc.get(bad.id).await.unwrap().unwrap().status,
        OrderStatus::Error,
        "坏订单应进入 Error 终态而不是阻塞本轮",
    );

    cleanup_test_data(&pool, &[good_owner, bad_owner], &[product_id]).await;
}

/// 对账 Worker 的单轮执行：复用 sweep 语义且绝不向外抛错
#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn test_worker_run_once() {
    let pool = connect_pool().await;
    let product_id = 94010;
    let owner_id = "integ_order_worker_001";
    cleanup_test_data(&pool, &[owner_id], &[product_id]).await;
    seed_product(&pool, product_id, "Foam Roller", Decimal::new(3000, 2), 2).await;
    seed_wallet(&pool, owner_id, Decimal::new(10000, 2)).await;

    let svc = Arc::new(setup_order_service(&pool));
    let order = svc.create(owner_id, product_id).await.unwrap();
    svc.mark_approved(order.id).await.unwrap();

    let worker = ReconciliationWorker::new(Arc::clone(&svc), 5, 100);
    let stats = worker.run_once().await;
    assert!(stats.settled >= 1, "Worker 单轮应结算已确认订单");

    assert_eq!(
        svc.get(order.id).await.unwrap().unwrap().status,
        OrderStatus::Completed,
    );

    cleanup_test_data(&pool, &[owner_id], &[product_id]).await;
}
