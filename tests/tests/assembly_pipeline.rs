//! Exercises the Definition Store and Test File Assembler together, across
//! the whole resolution chain a loaded project goes through: API reference
//! expansion, named-suite expansion (including a nested suite), call-site
//! argument substitution, and validator/extractor merging, all in one
//! assembled document.

use apirun_core::assembler::{assemble, DocItem};
use apirun_core::definitions::DefinitionStore;
use apirun_integration_tests::block;
use serde_json::json;

fn store_with_login_and_checkout() -> DefinitionStore {
    let mut store = DefinitionStore::new();
    store
        .insert_api(
            "api_login(username)",
            block(json!({
                "request": {"method": "POST", "url": "/login", "json": {"login_name": "username"}},
                "validate": [{"check": "status_code", "expect": 200}],
                "extract": [{"token": "content.token"}],
            })),
        )
        .unwrap();
    store
        .insert_api(
            "api_add_cart(code)",
            block(json!({
                "request": {"method": "POST", "url": "/cart", "json": {"product": "code"}},
                "validate": [{"check": "status_code", "expect": 201}],
            })),
        )
        .unwrap();
    store
        .insert_named_testcase(
            "cart_suite(code)",
            block(json!({})),
            vec![block(json!({"name": "add to cart", "api": "api_add_cart($code)"}))],
        )
        .unwrap();
    store
        .insert_named_testcase(
            "checkout_suite(username,item)",
            block(json!({})),
            vec![
                block(json!({"name": "log in", "api": "api_login($username)"})),
                block(json!({"suite": "cart_suite($item)"})),
            ],
        )
        .unwrap();
    store
}

#[test]
fn assembles_testcase_through_nested_suite_and_api_references() {
    let store = store_with_login_and_checkout();
    let config = block(json!({"name": "checkout smoke test"}));
    let items = vec![
        DocItem::Config(config),
        DocItem::Test(block(json!({"suite": "checkout_suite($user,$sku)"}))),
    ];

    let assembled = assemble(items, &store).unwrap();
    assert_eq!(assembled.config.get("name").unwrap(), "checkout smoke test");
    assert_eq!(assembled.teststeps.len(), 2);

    let login_step = &assembled.teststeps[0];
    assert_eq!(login_step.get("name").unwrap(), "log in");
    assert!(login_step.get("api").is_none(), "api reference should be consumed during expansion");
    assert_eq!(
        login_step.get("request").unwrap().get("json").unwrap().get("login_name").unwrap(),
        "$user",
        "the declared arg's bare-name placeholder substitutes to the call-site argument"
    );

    let cart_step = &assembled.teststeps[1];
    assert_eq!(cart_step.get("name").unwrap(), "add to cart");
    assert_eq!(
        cart_step.get("request").unwrap().get("json").unwrap().get("product").unwrap(),
        "$sku",
        "the outer suite call's argument threads through the nested suite's own call-site argument"
    );
}

#[test]
fn step_level_validators_merge_additively_with_the_api_definitions() {
    let store = store_with_login_and_checkout();
    let step = block(json!({
        "name": "log in",
        "api": "api_login($u)",
        "validate": [{"check": "content.token", "comparator": "len_gt", "expect": 0}],
    }));
    let items = vec![DocItem::Test(step)];

    let assembled = assemble(items, &store).unwrap();
    let validators = assembled.teststeps[0].get("validate").unwrap().as_array().unwrap();
    assert_eq!(validators.len(), 2, "the definition's status_code check and the step's token check both survive");
}

#[test]
fn unresolvable_reference_surfaces_as_a_pipeline_error() {
    let store = DefinitionStore::new();
    let items = vec![DocItem::Test(block(json!({"api": "does_not_exist()"})))];
    assert!(assemble(items, &store).is_err());
}
