mod common;

use axum::http::StatusCode;
use rust_decimal_macros::dec;
use serde_json::json;

use crate::common::{
    build_test_router, create_chit, create_member, dec_of, get, join, post, post_empty,
};

async fn pay(app: &axum::Router, member_id: i64, chit_id: i64, amount: i64) -> serde_json::Value {
    let (status, json) = post(
        app,
        "/accounts/payments",
        json!({ "member_id": member_id, "chit_id": chit_id, "amount": amount, "mode": "cash" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "payment failed: {}", json);
    json
}

async fn generate(app: &axum::Router, chit_id: i64, month_number: i64) -> (StatusCode, serde_json::Value) {
    post_empty(app, &format!("/accounts/dues/{}/{}", chit_id, month_number)).await
}

#[tokio::test]
async fn test_two_payments_leave_month_partial() {
    let app = build_test_router().await;
    let chit_id = create_chit(&app, 100000, 20, Some("2026-01-10")).await;
    let member = create_member(&app, "Deepa", "9100000001").await;
    join(&app, chit_id, member, 1).await;

    let (status, dues) = generate(&app, chit_id, 3).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(dues["entries_created"], 1);
    assert_eq!(dues["due_date"], "2026-03-10");
    assert_eq!(dec_of(&dues["amount_per_member"]), dec!(5000));

    pay(&app, member, chit_id, 2000).await;
    let second = pay(&app, member, chit_id, 1500).await;
    assert_eq!(second["allocations"][0]["month_number"], 3);
    assert_eq!(second["allocations"][0]["type"], "partial");
    assert_eq!(dec_of(&second["advance_amount"]), dec!(0));

    let (status, account) = get(&app, &format!("/accounts/members/{}", member)).await;
    assert_eq!(status, StatusCode::OK);
    let months = account["chits"][0]["months"].as_array().unwrap();
    assert_eq!(months.len(), 20);
    assert_eq!(months[0]["status"], "not_started");
    let third = &months[2];
    assert_eq!(third["status"], "partial");
    assert_eq!(dec_of(&third["due"]), dec!(5000));
    assert_eq!(dec_of(&third["paid"]), dec!(3500));
    assert_eq!(dec_of(&third["pending"]), dec!(1500));
    assert_eq!(dec_of(&account["total_pending"]), dec!(1500));

    let (_, months) = get(&app, &format!("/chits/{}/months", chit_id)).await;
    assert_eq!(dec_of(&months["months"][2]["total_collected"]), dec!(3500));
}

#[tokio::test]
async fn test_payment_fills_oldest_months_then_advance() {
    let app = build_test_router().await;
    let chit_id = create_chit(&app, 100000, 20, Some("2026-01-10")).await;
    let member = create_member(&app, "Eshwar", "9100000002").await;
    join(&app, chit_id, member, 1).await;
    generate(&app, chit_id, 1).await;
    generate(&app, chit_id, 2).await;

    let (status, preview) = get(
        &app,
        &format!("/accounts/payment-preview?member_id={}&chit_id={}&amount=12000", member, chit_id),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(preview["allocations"].as_array().unwrap().len(), 2);
    assert_eq!(dec_of(&preview["advance_amount"]), dec!(2000));

    // Preview writes nothing
    let (_, ledger) = get(&app, "/accounts/ledger?entry_type=credit").await;
    assert_eq!(ledger["total"], 0);

    let payment = pay(&app, member, chit_id, 12000).await;
    let allocations = payment["allocations"].as_array().unwrap();
    assert_eq!(allocations[0]["month_number"], 1);
    assert_eq!(allocations[0]["type"], "full");
    assert_eq!(allocations[1]["month_number"], 2);
    assert_eq!(dec_of(&payment["advance_amount"]), dec!(2000));
    assert_eq!(payment["ledger_entry_ids"].as_array().unwrap().len(), 3);

    let (_, advances) = get(&app, "/accounts/ledger?source=advance").await;
    assert_eq!(advances["total"], 1);
    assert!(advances["items"][0]["month_number"].is_null());

    let (_, account) = get(&app, &format!("/accounts/members/{}", member)).await;
    let chit = &account["chits"][0];
    assert_eq!(chit["months"][0]["status"], "paid");
    assert_eq!(chit["months"][1]["status"], "paid");
    assert_eq!(dec_of(&chit["total_advance"]), dec!(2000));
    assert_eq!(dec_of(&chit["total_pending"]), dec!(0));

    let (status, _) = post(
        &app,
        "/accounts/payments",
        json!({ "member_id": member, "chit_id": chit_id, "amount": 0, "mode": "gpay" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_generate_dues_validation() {
    let app = build_test_router().await;
    let chit_id = create_chit(&app, 60000, 12, None).await;

    let (status, json) = generate(&app, chit_id, 1).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "no members yet: {}", json);

    let member = create_member(&app, "Farah", "9100000003").await;
    join(&app, chit_id, member, 4).await;

    let (status, dues) = generate(&app, chit_id, 1).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(dues["due_date"].is_null());

    assert_eq!(generate(&app, chit_id, 1).await.0, StatusCode::BAD_REQUEST);
    assert_eq!(generate(&app, chit_id, 0).await.0, StatusCode::BAD_REQUEST);
    assert_eq!(generate(&app, chit_id, 13).await.0, StatusCode::BAD_REQUEST);
    assert_eq!(generate(&app, 9999, 1).await.0, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_ledger_pagination_and_filters() {
    let app = build_test_router().await;
    let chit_id = create_chit(&app, 100000, 20, Some("2026-01-10")).await;
    for slot in 1..=3 {
        let member = create_member(&app, &format!("Member {}", slot), &format!("92000000{:02}", slot)).await;
        join(&app, chit_id, member, slot).await;
    }
    generate(&app, chit_id, 1).await;
    generate(&app, chit_id, 2).await;

    let (status, page) = get(&app, "/accounts/ledger?per_page=4").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 6);
    assert_eq!(page["total_pages"], 2);
    assert_eq!(page["page"], 1);
    let items = page["items"].as_array().unwrap();
    assert_eq!(items.len(), 4);
    // Newest first
    assert!(items[0]["id"].as_i64() > items[1]["id"].as_i64());
    assert_eq!(items[0]["month_number"], 2);

    let (_, last) = get(&app, "/accounts/ledger?per_page=4&page=2").await;
    assert_eq!(last["items"].as_array().unwrap().len(), 2);

    let (_, month_one) = get(
        &app,
        &format!("/accounts/ledger?month_number=1&entry_type=debit&source=monthly_due&chit_id={}", chit_id),
    )
    .await;
    assert_eq!(month_one["total"], 3);

    let (_, other_year) = get(&app, "/accounts/ledger?year=1999").await;
    assert_eq!(other_year["total"], 0);

    assert_eq!(get(&app, "/accounts/ledger?page=0").await.0, StatusCode::BAD_REQUEST);
    assert_eq!(get(&app, "/accounts/ledger?per_page=0").await.0, StatusCode::BAD_REQUEST);
    assert_eq!(get(&app, "/accounts/ledger?per_page=101").await.0, StatusCode::BAD_REQUEST);
    assert_eq!(
        get(&app, "/accounts/ledger?page=18446744073709551615&per_page=50").await.0,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        get(&app, "/accounts/ledger?page=18446744073709551615").await.0,
        StatusCode::BAD_REQUEST
    );

    let (status, beyond) = get(&app, "/accounts/ledger?per_page=4&page=1000").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(beyond["items"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_dashboard_totals() {
    let app = build_test_router().await;
    // Due dates in the past so unpaid months are overdue
    let chit_id = create_chit(&app, 100000, 20, Some("2020-01-01")).await;
    let payer = create_member(&app, "Gita", "9300000001").await;
    let debtor = create_member(&app, "Hari", "9300000002").await;
    join(&app, chit_id, payer, 1).await;
    join(&app, chit_id, debtor, 2).await;
    generate(&app, chit_id, 1).await;
    pay(&app, payer, chit_id, 6000).await;

    let (status, dashboard) = get(&app, "/accounts/dashboard").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dec_of(&dashboard["total_due"]), dec!(10000));
    assert_eq!(dec_of(&dashboard["total_collected"]), dec!(6000));
    assert_eq!(dec_of(&dashboard["total_pending"]), dec!(5000));
    assert_eq!(dec_of(&dashboard["total_advance"]), dec!(1000));
    assert_eq!(dashboard["overdue_users"], 1);
    assert_eq!(dec_of(&dashboard["overdue_amount"]), dec!(5000));
    assert_eq!(dashboard["active_members"], 2);
    assert_eq!(dashboard["active_chits"], 1);

    // Unchanged ledger, unchanged totals
    let (_, again) = get(&app, "/accounts/dashboard").await;
    assert_eq!(dashboard, again);
}

#[tokio::test]
async fn test_adjustment_is_appended() {
    let app = build_test_router().await;
    let chit_id = create_chit(&app, 100000, 20, None).await;
    let member = create_member(&app, "Indu", "9400000001").await;
    join(&app, chit_id, member, 1).await;
    generate(&app, chit_id, 1).await;

    let (status, entry) = post(
        &app,
        "/accounts/ledger/adjustment",
        json!({
            "member_id": member,
            "chit_id": chit_id,
            "month_number": 1,
            "entry_type": "credit",
            "amount": 5000,
            "notes": "Waived by committee"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "adjustment failed: {}", entry);
    assert_eq!(entry["source"], "adjustment");

    let (_, account) = get(&app, &format!("/accounts/members/{}", member)).await;
    assert_eq!(account["chits"][0]["months"][0]["status"], "paid");

    let (_, ledger) = get(&app, "/accounts/ledger").await;
    assert_eq!(ledger["total"], 2);

    let (status, _) = post(
        &app,
        "/accounts/ledger/adjustment",
        json!({
            "member_id": member,
            "chit_id": chit_id,
            "month_number": 1,
            "entry_type": "debit",
            "amount": 100,
            "notes": "  "
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_defaulters_by_severity() {
    let app = build_test_router().await;
    let chit_id = create_chit(&app, 100000, 20, None).await;
    let low = create_member(&app, "Low", "9500000001").await;
    let medium = create_member(&app, "Medium", "9500000002").await;
    let high = create_member(&app, "High", "9500000003").await;
    join(&app, chit_id, low, 1).await;
    join(&app, chit_id, medium, 2).await;
    join(&app, chit_id, high, 3).await;
    for month in 1..=3 {
        generate(&app, chit_id, month).await;
    }
    pay(&app, low, chit_id, 12000).await;
    pay(&app, medium, chit_id, 7000).await;

    let (status, rows) = get(&app, &format!("/accounts/defaulters?chit_id={}", chit_id)).await;
    assert_eq!(status, StatusCode::OK);
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 3);

    assert_eq!(rows[0]["member_id"].as_i64(), Some(high));
    assert_eq!(dec_of(&rows[0]["pending_amount"]), dec!(15000));
    assert_eq!(rows[0]["pending_months"], json!([1, 2, 3]));
    assert_eq!(rows[0]["severity"], "high");

    assert_eq!(rows[1]["member_id"].as_i64(), Some(medium));
    assert_eq!(dec_of(&rows[1]["pending_amount"]), dec!(8000));
    assert_eq!(rows[1]["pending_months"], json!([2, 3]));
    assert_eq!(rows[1]["severity"], "medium");

    assert_eq!(rows[2]["member_id"].as_i64(), Some(low));
    assert_eq!(dec_of(&rows[2]["pending_amount"]), dec!(3000));
    assert_eq!(rows[2]["pending_months"], json!([3]));
    assert_eq!(rows[2]["severity"], "low");

    let (status, stats) = get(&app, &format!("/accounts/defaulters/stats?chit_id={}", chit_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total_defaulters"], 3);
    assert_eq!(dec_of(&stats["total_pending_amount"]), dec!(26000));
    assert_eq!(stats["severity_breakdown"], json!({ "high": 1, "medium": 1, "low": 1 }));

    assert_eq!(get(&app, "/accounts/defaulters?chit_id=9999").await.0, StatusCode::NOT_FOUND);
    assert_eq!(
        get(&app, "/accounts/defaulters/stats?chit_id=9999").await.0,
        StatusCode::NOT_FOUND
    );
    assert_eq!(get(&app, "/accounts/members/9999").await.0, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_payment_history() {
    let app = build_test_router().await;
    let chit_id = create_chit(&app, 100000, 20, None).await;
    let asha = create_member(&app, "Asha", "9600000001").await;
    let bala = create_member(&app, "Bala", "9600000002").await;
    join(&app, chit_id, asha, 1).await;
    join(&app, chit_id, bala, 2).await;
    generate(&app, chit_id, 1).await;
    generate(&app, chit_id, 2).await;

    pay(&app, asha, chit_id, 7000).await;
    pay(&app, bala, chit_id, 5000).await;
    let last = pay(&app, asha, chit_id, 4000).await;
    let last_id = last["payment_id"].as_i64().unwrap();

    let (status, all) = get(&app, "/accounts/payments").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all["total"], 3);
    assert_eq!(all["items"][0]["id"].as_i64(), Some(last_id));

    let (_, by_member) = get(&app, &format!("/accounts/payments?member_id={}", asha)).await;
    assert_eq!(by_member["total"], 2);
    let (_, by_alias) = get(&app, &format!("/accounts/payments?user_id={}", bala)).await;
    assert_eq!(by_alias["total"], 1);

    // Both of Asha's payments put money into month 2
    let (_, month_two) = get(&app, &format!("/accounts/payments?chit_id={}&month_number=2", chit_id)).await;
    assert_eq!(month_two["total"], 2);
    for item in month_two["items"].as_array().unwrap() {
        assert_eq!(item["member_id"].as_i64(), Some(asha));
    }
    let (_, month_one) = get(
        &app,
        &format!("/accounts/payments?member_id={}&month_number=1", bala),
    )
    .await;
    assert_eq!(month_one["total"], 1);

    let (status, record) = get(&app, &format!("/accounts/payments/{}", last_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["member_name"], "Asha");
    assert_eq!(record["chit_name"], "Test Kuri");
    assert_eq!(record["mode"], "cash");
    assert_eq!(dec_of(&record["amount"]), dec!(4000));
    let months = record["months"].as_array().unwrap();
    assert_eq!(months.len(), 1);
    assert_eq!(months[0]["month_number"], 2);
    assert_eq!(dec_of(&months[0]["amount"]), dec!(3000));
    assert_eq!(dec_of(&record["advance_amount"]), dec!(1000));

    assert_eq!(get(&app, "/accounts/payments/9999").await.0, StatusCode::NOT_FOUND);
    assert_eq!(
        get(&app, "/accounts/payments?page=18446744073709551615").await.0,
        StatusCode::BAD_REQUEST
    );
}
