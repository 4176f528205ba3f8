//! Request side of the DNSPod API
//!
//! Every call is a form-encoded POST to `<base>/<Endpoint>`. Each request type
//! maps its fields to form parameters explicitly; the public parameters are
//! prepended to all of them.

use ddns_core::config::PublicCredentials;
use ddns_core::record::DesiredRecord;

/// Form parameters, in the order they are sent
pub type FormParams = Vec<(&'static str, String)>;

/// One DNSPod API call
#[derive(Debug, Clone, Copy)]
pub enum ApiRequest<'a> {
    /// Account details, used to validate the token
    UserDetail,

    /// Records of a domain, optionally filtered by sub-domain
    RecordList {
        domain: &'a str,
        sub_domain: Option<&'a str>,
    },

    /// Create a record holding `value`
    RecordCreate {
        record: &'a DesiredRecord,
        value: &'a str,
    },

    /// Overwrite an existing record
    RecordModify {
        record: &'a DesiredRecord,
        record_id: &'a str,
        value: &'a str,
    },
}

impl ApiRequest<'_> {
    /// Endpoint path, appended to the API base URL
    pub fn endpoint(&self) -> &'static str {
        match self {
            ApiRequest::UserDetail => "User.Detail",
            ApiRequest::RecordList { .. } => "Record.List",
            ApiRequest::RecordCreate { .. } => "Record.Create",
            ApiRequest::RecordModify { .. } => "Record.Modify",
        }
    }

    /// Build the form body
    ///
    /// Contains the login token: never log the result.
    pub fn form(&self, credentials: &PublicCredentials) -> FormParams {
        let mut params = public_params(credentials);

        match *self {
            ApiRequest::UserDetail => {}
            ApiRequest::RecordList { domain, sub_domain } => {
                params.push(("domain", domain.to_string()));
                if let Some(sub_domain) = sub_domain {
                    params.push(("sub_domain", sub_domain.to_string()));
                }
            }
            ApiRequest::RecordCreate { record, value } => {
                push_record_params(&mut params, record, value);
            }
            ApiRequest::RecordModify {
                record,
                record_id,
                value,
            } => {
                params.push(("record_id", record_id.to_string()));
                push_record_params(&mut params, record, value);
            }
        }

        params
    }
}

fn public_params(credentials: &PublicCredentials) -> FormParams {
    vec![
        ("login_token", credentials.login_token()),
        ("format", credentials.format.clone()),
        ("lang", credentials.lang.as_str().to_string()),
        ("error_on_empty", credentials.error_on_empty.as_str().to_string()),
    ]
}

fn push_record_params(params: &mut FormParams, record: &DesiredRecord, value: &str) {
    params.push(("domain", record.domain.clone()));
    params.push(("sub_domain", record.sub_domain.clone()));
    params.push(("record_type", record.record_type.as_str().to_string()));
    params.push(("record_line", record.record_line.clone()));
    params.push(("value", value.to_string()));
    params.push(("ttl", record.ttl.to_string()));
    params.push(("status", record.status.as_str().to_string()));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value_of<'p>(params: &'p FormParams, key: &str) -> Option<&'p str> {
        params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn public_params_lead_every_request() {
        let credentials = PublicCredentials::new("12345", "secret");
        let params = ApiRequest::UserDetail.form(&credentials);

        let keys: Vec<&str> = params.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["login_token", "format", "lang", "error_on_empty"]);
        assert_eq!(value_of(&params, "login_token"), Some("12345,secret"));
        assert_eq!(value_of(&params, "error_on_empty"), Some("no"));
    }

    #[test]
    fn list_without_sub_domain_omits_filter() {
        let credentials = PublicCredentials::new("12345", "secret");
        let params = ApiRequest::RecordList {
            domain: "example.com",
            sub_domain: None,
        }
        .form(&credentials);

        assert_eq!(value_of(&params, "domain"), Some("example.com"));
        assert_eq!(value_of(&params, "sub_domain"), None);
    }

    #[test]
    fn modify_carries_record_id_and_record_fields() {
        let credentials = PublicCredentials::new("12345", "secret");
        let record = DesiredRecord::new("example.com", "home").with_ttl(120);
        let request = ApiRequest::RecordModify {
            record: &record,
            record_id: "123",
            value: "203.0.113.5",
        };

        let params = request.form(&credentials);

        assert_eq!(request.endpoint(), "Record.Modify");
        assert_eq!(value_of(&params, "record_id"), Some("123"));
        assert_eq!(value_of(&params, "sub_domain"), Some("home"));
        assert_eq!(value_of(&params, "record_type"), Some("A"));
        assert_eq!(value_of(&params, "record_line"), Some("默认"));
        assert_eq!(value_of(&params, "value"), Some("203.0.113.5"));
        assert_eq!(value_of(&params, "ttl"), Some("120"));
        assert_eq!(value_of(&params, "status"), Some("enable"));
    }
}
