use std::sync::Arc;

use agentrun_sdk::agents::AgentsClient;
use agentrun_sdk::client::AgentsService;
use agentrun_sdk::credential::{
    AzureCliCredential, DefaultCredential, StaticTokenCredential, TokenCredential,
};
use agentrun_sdk::mock::MockAgentsService;

#[test]
fn test_all_services_implement_trait() {
    fn assert_implements_trait<T: AgentsService>() {}

    assert_implements_trait::<AgentsClient>();
    assert_implements_trait::<MockAgentsService>();
}

#[test]
fn test_all_credentials_implement_trait() {
    fn assert_implements_trait<T: TokenCredential>() {}

    assert_implements_trait::<StaticTokenCredential>();
    assert_implements_trait::<AzureCliCredential>();
    assert_implements_trait::<DefaultCredential>();
}

#[test]
fn test_trait_object_usage() {
    let credential: Arc<dyn TokenCredential> =
        Arc::new(StaticTokenCredential::new("test-token").unwrap());
    let _client: Box<dyn AgentsService> =
        Box::new(AgentsClient::new("https://example.test", credential).unwrap());
    let _mock: Box<dyn AgentsService> = Box::new(MockAgentsService::new());
}

#[test]
fn test_service_names() {
    let credential = Arc::new(StaticTokenCredential::new("test-token").unwrap());
    let client = AgentsClient::new("https://example.test", credential).unwrap();
    assert_eq!(client.service_name(), "azure-ai-projects");
    assert_eq!(MockAgentsService::new().service_name(), "mock");
}
