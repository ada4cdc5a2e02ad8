//! Users and groups endpoints.

use crate::client::{Client, Listing};
use crate::endpoint::Query;
use crate::error::{Error, Result};
use crate::executor::{to_body, Endpoint};
use crate::filter::Filter;
use crate::models::{Group, User};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Serialize, Deserialize)]
struct UserBody {
    user: User,
}

#[derive(Debug, Serialize, Deserialize)]
struct GroupBody {
    group: Group,
}

/// Options for [`UsersGroups::remove_user_from_site`]
#[derive(Debug, Clone, Default)]
pub struct RemoveUserOptions {
    /// Reassign the removed user's content to this user id
    pub map_assets_to: Option<String>,
}

/// Users and groups endpoints of a [`Client`]
pub struct UsersGroups<'a> {
    client: &'a Client,
}

fn name_filter(names: &[&str]) -> Option<Filter> {
    if names.is_empty() {
        None
    } else {
        Some(Filter::new().any_of("name", names.iter().copied()))
    }
}

impl<'a> UsersGroups<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        UsersGroups { client }
    }

    /// Add a user to a group.
    ///
    /// `POST /api/{version}/sites/{site}/groups/{group}/users`
    pub fn add_user_to_group(&self, user_id: &str, group_id: &str) -> Result<User> {
        let session = self.client.session()?;
        let url = self
            .client
            .resource_url(&["sites", &session.site_id, "groups", group_id, "users"])?;
        let body = json!({ "user": { "id": user_id } });

        let response: UserBody =
            self.client
                .executor()
                .call(&Endpoint::post(url), Some(&body), session.credential())?;
        Ok(response.user)
    }

    /// Add a user to the current site with the given name and site role.
    ///
    /// `POST /api/{version}/sites/{site}/users`
    pub fn add_user_to_site(&self, user: &User) -> Result<User> {
        if user.name.as_deref().map_or(true, str::is_empty) {
            return Err(Error::BadRequest("user name is required".to_string()));
        }

        let session = self.client.session()?;
        let url = self.client.resource_url(&["sites", &session.site_id, "users"])?;
        let body = to_body(&UserBody {
            user: User {
                name: user.name.clone(),
                site_role: user.site_role.clone(),
                auth_setting: user.auth_setting.clone(),
                ..User::default()
            },
        })?;

        let response: UserBody = self.client.executor().call(
            &Endpoint::post(url).expect(&[201]),
            Some(&body),
            session.credential(),
        )?;
        Ok(response.user)
    }

    /// Create a group, or import one from Active Directory when
    /// `group.import` is set.
    ///
    /// `POST /api/{version}/sites/{site}/groups`
    pub fn create_group(&self, group: &Group) -> Result<Group> {
        if group.name.as_deref().map_or(true, str::is_empty) {
            return Err(Error::BadRequest("group name is required".to_string()));
        }

        let session = self.client.session()?;
        let url = self.client.resource_url(&["sites", &session.site_id, "groups"])?;
        let body = to_body(&GroupBody {
            group: Group {
                id: None,
                ..group.clone()
            },
        })?;

        let response: GroupBody = self.client.executor().call(
            &Endpoint::post(url).expect(&[201, 202]),
            Some(&body),
            session.credential(),
        )?;
        Ok(response.group)
    }

    /// `DELETE /api/{version}/sites/{site}/groups/{group}`
    pub fn delete_group(&self, group_id: &str) -> Result<()> {
        let session = self.client.session()?;
        let url = self
            .client
            .resource_url(&["sites", &session.site_id, "groups", group_id])?;
        self.client
            .executor()
            .call_empty(&Endpoint::delete(url), None, session.credential())
    }

    /// Groups the user belongs to (all pages).
    pub fn get_groups_for_user(&self, user_id: &str) -> Result<Vec<Group>> {
        let session = self.client.session()?;
        let url = self
            .client
            .resource_url(&["sites", &session.site_id, "users", user_id, "groups"])?;
        self.client
            .list(&session, Listing::new(url, "groups", "group"))
    }

    /// Members of a group (all pages).
    pub fn get_users_in_group(&self, group_id: &str) -> Result<Vec<User>> {
        let session = self.client.session()?;
        let url = self
            .client
            .resource_url(&["sites", &session.site_id, "groups", group_id, "users"])?;
        self.client.list(&session, Listing::new(url, "users", "user"))
    }

    /// Users of the current site, optionally restricted to the given names.
    pub fn get_users_on_site(&self, names: &[&str]) -> Result<Vec<User>> {
        let session = self.client.session()?;
        let filter = name_filter(names);
        let url = self.client.resource_url(&["sites", &session.site_id, "users"])?;
        self.client.list(
            &session,
            Listing::new(url, "users", "user").filter(filter.as_ref()),
        )
    }

    /// Groups of the current site, optionally restricted to the given names.
    pub fn query_groups(&self, names: &[&str]) -> Result<Vec<Group>> {
        let session = self.client.session()?;
        let filter = name_filter(names);
        let url = self.client.resource_url(&["sites", &session.site_id, "groups"])?;
        self.client.list(
            &session,
            Listing::new(url, "groups", "group").filter(filter.as_ref()),
        )
    }

    /// `GET /api/{version}/sites/{site}/users/{user}`
    pub fn query_user_on_site(&self, user_id: &str) -> Result<User> {
        let session = self.client.session()?;
        let url = self
            .client
            .resource_url(&["sites", &session.site_id, "users", user_id])?;
        let response: UserBody =
            self.client
                .executor()
                .call(&Endpoint::get(url), None, session.credential())?;
        Ok(response.user)
    }

    /// Remove a user from the current site.
    ///
    /// The server refuses while the user still owns content
    /// ([`ErrorKind::UserAssetConflict`](crate::ErrorKind::UserAssetConflict))
    /// unless `options.map_assets_to` names a new owner.
    pub fn remove_user_from_site(&self, user_id: &str, options: RemoveUserOptions) -> Result<()> {
        let session = self.client.session()?;
        let mut url = self
            .client
            .resource_url(&["sites", &session.site_id, "users", user_id])?;
        if let Some(new_owner) = options.map_assets_to.filter(|id| !id.is_empty()) {
            Query::new().param("mapAssetsTo", new_owner).apply(&mut url);
        }

        self.client
            .executor()
            .call_empty(&Endpoint::delete(url), None, session.credential())
    }

    /// `DELETE /api/{version}/sites/{site}/groups/{group}/users/{user}`
    pub fn remove_user_from_group(&self, user_id: &str, group_id: &str) -> Result<()> {
        let session = self.client.session()?;
        let url = self
            .client
            .resource_url(&["sites", &session.site_id, "groups", group_id, "users", user_id])?;
        self.client
            .executor()
            .call_empty(&Endpoint::delete(url), None, session.credential())
    }

    /// Update a group's name, minimum site role or import settings.
    /// `group.id` selects the group.
    pub fn update_group(&self, group: &Group) -> Result<Group> {
        let group_id = match group.id.as_deref() {
            Some(id) if !id.is_empty() => id,
            _ => return Err(Error::BadRequest("group id is required".to_string())),
        };

        let session = self.client.session()?;
        let url = self
            .client
            .resource_url(&["sites", &session.site_id, "groups", group_id])?;
        let body = to_body(&GroupBody {
            group: Group {
                id: None,
                ..group.clone()
            },
        })?;

        let response: GroupBody = self.client.executor().call(
            &Endpoint::put(url).expect(&[200, 202]),
            Some(&body),
            session.credential(),
        )?;
        Ok(response.group)
    }

    /// Update a user's full name, email, password, site role or auth
    /// setting. `user.id` selects the user.
    pub fn update_user(&self, user: &User) -> Result<User> {
        let user_id = match user.id.as_deref() {
            Some(id) if !id.is_empty() => id,
            _ => return Err(Error::BadRequest("user id is required".to_string())),
        };

        let session = self.client.session()?;
        let url = self
            .client
            .resource_url(&["sites", &session.site_id, "users", user_id])?;
        let body = to_body(&UserBody {
            user: User {
                full_name: user.full_name.clone(),
                email: user.email.clone(),
                password: user.password.clone(),
                site_role: user.site_role.clone(),
                auth_setting: user.auth_setting.clone(),
                ..User::default()
            },
        })?;

        let response: UserBody =
            self.client
                .executor()
                .call(&Endpoint::put(url), Some(&body), session.credential())?;
        Ok(response.user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::ErrorKind;
    use crate::models::site_role;
    use crate::retry::RetryPolicy;
    use crate::testing::{sign_in_body, ScriptedTransport};
    use crate::transport::HttpRequest;
    use serde_json::Value;

    fn signed_in_client(transport: &ScriptedTransport) -> Client {
        transport.reply_json(200, sign_in_body("tok", "S1", "U0"));
        let config = Config::new("https://tableau.example.com", "admin", "secret")
            .with_version("3.12")
            .with_retry(RetryPolicy::never());
        Client::with_transport(config, transport.clone()).unwrap()
    }

    fn body(request: &HttpRequest) -> Value {
        serde_json::from_slice(request.body.as_deref().unwrap()).unwrap()
    }

    #[test]
    fn test_add_user_to_group() {
        let transport = ScriptedTransport::new();
        let client = signed_in_client(&transport);
        transport.reply_json(200, json!({"user": {"id": "U1", "name": "alice"}}));

        let user = client.users_groups().add_user_to_group("U1", "G1").unwrap();
        assert_eq!(user.name.as_deref(), Some("alice"));

        let request = &transport.requests()[1];
        assert_eq!(request.method, reqwest::Method::POST);
        assert_eq!(
            request.url.as_str(),
            "https://tableau.example.com/api/3.12/sites/S1/groups/G1/users"
        );
        assert_eq!(body(request), json!({"user": {"id": "U1"}}));
    }

    #[test]
    fn test_add_user_to_site_expects_created() {
        let transport = ScriptedTransport::new();
        let client = signed_in_client(&transport);
        transport.reply_json(
            201,
            json!({"user": {"id": "U9", "name": "bob", "siteRole": "Viewer"}}),
        );

        let user = client
            .users_groups()
            .add_user_to_site(&User {
                name: Some("bob".to_string()),
                site_role: Some(site_role::VIEWER.to_string()),
                email: Some("ignored@example.com".to_string()),
                ..User::default()
            })
            .unwrap();
        assert_eq!(user.id.as_deref(), Some("U9"));
        assert_eq!(
            body(&transport.requests()[1]),
            json!({"user": {"name": "bob", "siteRole": "Viewer"}})
        );
    }

    #[test]
    fn test_add_user_to_site_conflict() {
        let transport = ScriptedTransport::new();
        let client = signed_in_client(&transport);
        transport.reply_json(409, json!({"error": {"code": "409000"}}));

        let err = client
            .users_groups()
            .add_user_to_site(&User {
                name: Some("bob".to_string()),
                ..User::default()
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UserAlreadyOnSite);
    }

    #[test]
    fn test_missing_inputs_fail_before_any_request() {
        let transport = ScriptedTransport::new();
        let config = Config::new("https://tableau.example.com", "admin", "secret");
        let client = Client::with_transport(config, transport.clone()).unwrap();
        let api = client.users_groups();

        assert!(matches!(api.add_user_to_site(&User::default()), Err(Error::BadRequest(_))));
        assert!(matches!(api.create_group(&Group::default()), Err(Error::BadRequest(_))));
        assert!(matches!(api.update_group(&Group::default()), Err(Error::BadRequest(_))));
        assert!(matches!(api.update_user(&User::default()), Err(Error::BadRequest(_))));
        assert_eq!(transport.request_count(), 0);
    }

    #[test]
    fn test_create_group_accepts_async_import() {
        let transport = ScriptedTransport::new();
        let client = signed_in_client(&transport);
        transport.reply_json(202, json!({"group": {"id": "G7", "name": "Analysts"}}));

        let group = client
            .users_groups()
            .create_group(&Group {
                name: Some("Analysts".to_string()),
                minimum_site_role: Some(site_role::EXPLORER.to_string()),
                ..Group::default()
            })
            .unwrap();
        assert_eq!(group.id.as_deref(), Some("G7"));
        assert_eq!(
            body(&transport.requests()[1]),
            json!({"group": {"name": "Analysts", "minimumSiteRole": "Explorer"}})
        );
    }

    #[test]
    fn test_ids_stay_single_segment() {
        let transport = ScriptedTransport::new();
        let client = signed_in_client(&transport);
        transport.reply(204, "");

        client.users_groups().delete_group("../../users/U9").unwrap();
        let request = &transport.requests()[1];
        assert_eq!(request.method, reqwest::Method::DELETE);
        assert_eq!(
            request.url.as_str(),
            "https://tableau.example.com/api/3.12/sites/S1/groups/..%2F..%2Fusers%2FU9"
        );

        let err = client.users_groups().delete_group("..").unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
        let err = client.users_groups().query_user_on_site("").unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
        assert_eq!(transport.request_count(), 2);
    }

    #[test]
    fn test_delete_group() {
        let transport = ScriptedTransport::new();
        let client = signed_in_client(&transport);
        transport.reply(204, "");

        client.users_groups().delete_group("G1").unwrap();
        let request = &transport.requests()[1];
        assert_eq!(request.method, reqwest::Method::DELETE);
        assert_eq!(
            request.url.as_str(),
            "https://tableau.example.com/api/3.12/sites/S1/groups/G1"
        );
    }

    #[test]
    fn test_get_users_on_site_with_names() {
        let transport = ScriptedTransport::new();
        let client = signed_in_client(&transport);
        transport.reply_json(
            200,
            json!({
                "pagination": {"pageNumber": "1", "pageSize": "500", "totalAvailable": "2"},
                "users": {"user": [{"name": "alice"}, {"name": "bob"}]}
            }),
        );

        let users = client
            .users_groups()
            .get_users_on_site(&["alice", "bob"])
            .unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(
            transport.requests()[1].url.query(),
            Some("pageSize=500&pageNumber=1&filter=name:in:[alice,bob]")
        );
    }

    #[test]
    fn test_query_groups_without_names_has_no_filter() {
        let transport = ScriptedTransport::new();
        let client = signed_in_client(&transport);
        transport.reply_json(
            200,
            json!({"pagination": {"totalAvailable": "0"}, "groups": {}}),
        );

        let groups = client.users_groups().query_groups(&[]).unwrap();
        assert!(groups.is_empty());
        assert_eq!(
            transport.requests()[1].url.query(),
            Some("pageSize=500&pageNumber=1")
        );
    }

    #[test]
    fn test_remove_user_from_site_maps_assets() {
        let transport = ScriptedTransport::new();
        let client = signed_in_client(&transport);
        transport.reply(204, "").reply(204, "");

        let api = client.users_groups();
        api.remove_user_from_site("U1", RemoveUserOptions::default())
            .unwrap();
        api.remove_user_from_site(
            "U2",
            RemoveUserOptions {
                map_assets_to: Some("U3".to_string()),
            },
        )
        .unwrap();

        let requests = transport.requests();
        assert_eq!(requests[1].url.query(), None);
        assert_eq!(
            requests[2].url.as_str(),
            "https://tableau.example.com/api/3.12/sites/S1/users/U2?mapAssetsTo=U3"
        );
    }

    #[test]
    fn test_remove_user_asset_conflict() {
        let transport = ScriptedTransport::new();
        let client = signed_in_client(&transport);
        transport.reply_json(409, json!({"error": {"code": "409003"}}));

        let err = client
            .users_groups()
            .remove_user_from_site("U1", RemoveUserOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UserAssetConflict);
    }

    #[test]
    fn test_update_user_sends_only_mutable_fields() {
        let transport = ScriptedTransport::new();
        let client = signed_in_client(&transport);
        transport.reply_json(200, json!({"user": {"id": "U1", "fullName": "Alice A"}}));

        let user = client
            .users_groups()
            .update_user(&User {
                id: Some("U1".to_string()),
                name: Some("not sent".to_string()),
                full_name: Some("Alice A".to_string()),
                ..User::default()
            })
            .unwrap();
        assert_eq!(user.full_name.as_deref(), Some("Alice A"));

        let request = &transport.requests()[1];
        assert_eq!(request.method, reqwest::Method::PUT);
        assert_eq!(body(request), json!({"user": {"fullName": "Alice A"}}));
    }

    #[test]
    fn test_update_group() {
        let transport = ScriptedTransport::new();
        let client = signed_in_client(&transport);
        transport.reply_json(200, json!({"group": {"id": "G1", "name": "Renamed"}}));

        let group = client
            .users_groups()
            .update_group(&Group {
                id: Some("G1".to_string()),
                name: Some("Renamed".to_string()),
                ..Group::default()
            })
            .unwrap();
        assert_eq!(group.name.as_deref(), Some("Renamed"));
        assert_eq!(body(&transport.requests()[1]), json!({"group": {"name": "Renamed"}}));
    }
}
