//! Integration tests for the HTTP client.
//!
//! Each test runs `OctopusClient` against a local `wiremock` server.

use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use octopus_cli::api::{ApiError, OctopusApi, OctopusClient};
use octopus_cli::core::variables::{Project, Variable};

const API_KEY: &str = "API-TESTKEY";

async fn server_with_spaces() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/spaces/all"))
        .and(header("X-Octopus-ApiKey", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "Id": "Spaces-1", "Name": "Default", "IsDefault": true },
            { "Id": "Spaces-2", "Name": "Platform", "IsDefault": false }
        ])))
        .mount(&server)
        .await;
    server
}

fn project() -> Project {
    Project {
        id: "Projects-1".into(),
        name: "Deploy Website".into(),
        slug: "deploy-website".into(),
        space_id: "Spaces-1".into(),
        variable_set_id: "variableset-Projects-1".into(),
        is_version_controlled: false,
        ..Default::default()
    }
}

fn variable_set() -> Value {
    json!({
        "Id": "variableset-Projects-1",
        "OwnerId": "Projects-1",
        "Version": 3,
        "Variables": [
            {
                "Id": "v-1",
                "Name": "Port",
                "Value": "8080",
                "Description": null,
                "Scope": { "Environment": ["Environments-1"] },
                "IsEditable": true,
                "IsSensitive": false,
                "Type": "String",
                "Prompt": null,
                "SpaceId": "Spaces-1"
            }
        ],
        "ScopeValues": {
            "Environments": [{ "Id": "Environments-1", "Name": "Test" }],
            "Machines": null,
            "Processes": [{ "ProcessType": "Runbook", "Id": "Runbooks-1", "Name": "Restart" }]
        },
        "SpaceId": "Spaces-1"
    })
}

mod connect_tests {
    use super::*;

    #[tokio::test]
    async fn default_space_selected() {
        let server = server_with_spaces().await;

        let client = OctopusClient::connect(&server.uri(), API_KEY, None).await.unwrap();

        assert_eq!(client.space_id(), "Spaces-1");
        assert_eq!(client.host(), server.uri());
    }

    #[tokio::test]
    async fn space_by_name_ignores_case() {
        let server = server_with_spaces().await;

        let client = OctopusClient::connect(&server.uri(), API_KEY, Some("platform"))
            .await
            .unwrap();

        assert_eq!(client.space_id(), "Spaces-2");
    }

    #[tokio::test]
    async fn unknown_space() {
        let server = server_with_spaces().await;

        let err = OctopusClient::connect(&server.uri(), API_KEY, Some("Missing"))
            .await
            .unwrap_err();

        assert_eq!(err, ApiError::SpaceNotFound("Missing".into()));
    }

    #[tokio::test]
    async fn rejected_key_maps_to_auth_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/spaces/all"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({ "ErrorMessage": "Invalid API key" })),
            )
            .mount(&server)
            .await;

        let err = OctopusClient::connect(&server.uri(), "API-WRONG", None)
            .await
            .unwrap_err();

        assert_eq!(err, ApiError::AuthFailed("Invalid API key".into()));
    }
}

mod resource_tests {
    use super::*;

    fn client(server: &MockServer) -> OctopusClient {
        OctopusClient::new(&server.uri(), API_KEY, "Spaces-1").unwrap()
    }

    #[tokio::test]
    async fn project_falls_back_to_name_search() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/Spaces-1/projects/deploy-site"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/Spaces-1/projects/all"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "Id": "Projects-9", "Name": "Other", "Slug": "other" },
                { "Id": "Projects-1", "Name": "Deploy-Site", "Slug": "deploy-website",
                  "VariableSetId": "variableset-Projects-1" }
            ])))
            .mount(&server)
            .await;

        let project = client(&server).get_project("deploy-site").await.unwrap();
        assert_eq!(project.id, "Projects-1");
        assert_eq!(project.variable_set_id, "variableset-Projects-1");

        let err = client(&server).get_project("nothing").await.unwrap_err();
        assert_eq!(err, ApiError::ProjectNotFound("nothing".into()));
    }

    #[tokio::test]
    async fn variables_keep_unknown_fields_on_write() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/Spaces-1/variables/variableset-Projects-1"))
            .and(header("X-Octopus-ApiKey", API_KEY))
            .respond_with(ResponseTemplate::new(200).set_body_json(variable_set()))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/api/Spaces-1/variables/variableset-Projects-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(variable_set()))
            .mount(&server)
            .await;

        let api = client(&server);
        let mut set = api.get_variables(&project(), None).await.unwrap();
        assert_eq!(set.variables[0].scope.environments, ["Environments-1"]);
        assert_eq!(set.scope_values.processes[0].name, "Restart");
        assert!(set.scope_values.machines.is_empty());

        let mut added = Variable::new("Region");
        added.value = Some("eu".into());
        set.variables.push(added);
        api.update_variables(&project(), None, &set).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let put = requests
            .iter()
            .find(|r| r.method.as_str() == "PUT")
            .expect("PUT request");
        let body: Value = serde_json::from_slice(&put.body).unwrap();
        assert_eq!(body["SpaceId"], "Spaces-1");
        assert_eq!(body["Version"], 3);
        assert_eq!(body["Variables"][0]["SpaceId"], "Spaces-1");
        assert_eq!(body["Variables"][1]["Name"], "Region");
        assert!(body["Variables"][1].get("Id").is_none());
    }

    #[tokio::test]
    async fn server_errors_carry_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/Spaces-1/workerpools/all"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "ErrorMessage": "There was a problem with your request.",
                "Errors": ["Pool index corrupt"]
            })))
            .mount(&server)
            .await;

        let err = client(&server).list_worker_pools().await.unwrap_err();

        assert_eq!(
            err,
            ApiError::Api {
                status: 500,
                message: "There was a problem with your request.: Pool index corrupt".into(),
            }
        );
    }

    #[tokio::test]
    async fn accounts_filtered_by_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/Spaces-1/accounts/all"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "Id": "Accounts-1", "Name": "Azure Prod", "AccountType": "AzureServicePrincipal" },
                { "Id": "Accounts-2", "Name": "AWS Prod", "AccountType": "AmazonWebServicesAccount" }
            ])))
            .mount(&server)
            .await;

        let accounts = client(&server)
            .list_accounts("AmazonWebServicesAccount")
            .await
            .unwrap();

        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].name, "AWS Prod");
    }

    #[tokio::test]
    async fn project_update_sends_whole_document() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/Spaces-1/projects/Projects-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Id": "Projects-1",
                "Name": "Deploy Website",
                "Slug": "deploy-website",
                "VariableSetId": "variableset-Projects-1",
                "IncludedLibraryVariableSetIds": ["LibraryVariableSets-1"],
                "LifecycleId": "Lifecycles-1"
            })))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/api/Spaces-1/projects/Projects-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Id": "Projects-1",
                "Name": "Deploy Website",
                "IncludedLibraryVariableSetIds": ["LibraryVariableSets-1", "LibraryVariableSets-2"]
            })))
            .mount(&server)
            .await;

        let api = client(&server);
        let mut project = api.get_project("Projects-1").await.unwrap();
        assert!(project.include("LibraryVariableSets-2"));
        let stored = api.update_project(&project).await.unwrap();
        assert!(stored.includes("LibraryVariableSets-2"));

        let requests = server.received_requests().await.unwrap();
        let put = requests
            .iter()
            .find(|r| r.method.as_str() == "PUT")
            .expect("PUT request");
        let body: Value = serde_json::from_slice(&put.body).unwrap();
        assert_eq!(body["LifecycleId"], "Lifecycles-1");
        assert_eq!(
            body["IncludedLibraryVariableSetIds"],
            json!(["LibraryVariableSets-1", "LibraryVariableSets-2"])
        );
    }

    #[tokio::test]
    async fn script_modules_not_listed_as_variable_sets() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/Spaces-1/libraryvariablesets/all"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "Id": "LibraryVariableSets-1", "Name": "Slack", "ContentType": "Variables" },
                { "Id": "LibraryVariableSets-2", "Name": "Helpers", "ContentType": "ScriptModule",
                  "Description": null }
            ])))
            .mount(&server)
            .await;

        let sets = client(&server).list_library_variable_sets().await.unwrap();

        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].id, "LibraryVariableSets-1");
    }
}
