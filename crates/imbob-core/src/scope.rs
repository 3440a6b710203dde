//! Scoped authorization overlay.
//!
//! Policies are declared once, when the API is assembled, by tagging whole
//! types ([`ScopeOverlayBuilder::guard_type`]) or single fields
//! ([`ScopeOverlayBuilder::redact_field`]). Every output object then passes
//! through [`ScopeOverlay::resolve`] together with the caller's [`Grants`]:
//!
//! - a guarded type the caller may not see fails with
//!   [`Error::AuthorizationDenied`], aborting that object only;
//! - a guarded field the caller may not see is replaced by [`REDACTED`] and
//!   the object still resolves.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator as _};

use crate::{Error, Result};

/// Substituted for any redacted field value.
pub const REDACTED: &str = "You are not authorized to view personal information";

/// A named permission carried by a credential.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Scope {
  /// General API access.
  Read,
  /// Personal data such as email addresses.
  Personal,
  /// Runtime and administrative information.
  Admin,
}

/// Maps a presented bearer token to authorization and scopes.
///
/// Implementations are process-wide and read-only at request time.
pub trait AccessPolicy: Send + Sync {
  /// Whether `token` is a known, unexpired credential bearing any scope.
  fn is_authorized(&self, token: &str) -> bool;

  fn has_scope(&self, token: &str, scope: Scope) -> bool;
}

/// Extract the token from an `Authorization` header value.
///
/// Accepts `Bearer <token>` as well as a bare token. Blank values yield
/// `None`.
pub fn bearer_token(header: &str) -> Option<&str> {
  let header = header.trim();
  let token = match header.split_once(' ') {
    Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
    Some(_) => return None,
    None if header.eq_ignore_ascii_case("bearer") => return None,
    None => header,
  };
  (!token.is_empty()).then_some(token)
}

// ─── Grants ──────────────────────────────────────────────────────────────────

/// What one caller may see, resolved once per request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grants {
  authorized: bool,
  scopes:     BTreeSet<Scope>,
}

impl Grants {
  /// No token: unauthorized, no scopes.
  pub fn anonymous() -> Self { Self::default() }

  pub fn resolve<P: AccessPolicy + ?Sized>(
    policy: &P,
    token: Option<&str>,
  ) -> Self {
    let Some(token) = token else {
      return Self::anonymous();
    };
    Self {
      authorized: policy.is_authorized(token),
      scopes:     Scope::iter().filter(|s| policy.has_scope(token, *s)).collect(),
    }
  }

  pub fn is_authorized(&self) -> bool { self.authorized }

  pub fn has(&self, scope: Scope) -> bool { self.scopes.contains(&scope) }
}

// ─── Overlay ─────────────────────────────────────────────────────────────────

/// An output type the overlay can intercept.
pub trait Resolvable: Serialize {
  /// Name policies are registered under.
  const TYPE_NAME: &'static str;
}

/// Declarative per-type and per-field scope policies.
#[derive(Debug, Clone, Default)]
pub struct ScopeOverlay {
  types:  HashMap<&'static str, Scope>,
  fields: HashMap<&'static str, Vec<(&'static str, Scope)>>,
}

impl ScopeOverlay {
  pub fn builder() -> ScopeOverlayBuilder { ScopeOverlayBuilder::default() }

  /// Serialise `value` and apply the policies registered for `T`.
  pub fn resolve<T: Resolvable>(&self, value: &T, grants: &Grants) -> Result<Value> {
    self.resolve_value(T::TYPE_NAME, serde_json::to_value(value)?, grants)
  }

  /// Apply the policies registered for `type_name` to an already-serialised
  /// object.
  pub fn resolve_value(
    &self,
    type_name: &str,
    mut value: Value,
    grants: &Grants,
  ) -> Result<Value> {
    if let Some((name, scope)) = self.types.get_key_value(type_name)
      && !(grants.is_authorized() && grants.has(*scope))
    {
      return Err(Error::AuthorizationDenied { type_name: name });
    }

    if let (Some(fields), Value::Object(map)) =
      (self.fields.get(type_name), &mut value)
    {
      for (field, scope) in fields {
        if grants.has(*scope) {
          continue;
        }
        if let Some(slot) = map.get_mut(*field) {
          *slot = Value::String(REDACTED.to_owned());
        }
      }
    }
    Ok(value)
  }
}

#[derive(Debug, Default)]
pub struct ScopeOverlayBuilder {
  overlay: ScopeOverlay,
}

impl ScopeOverlayBuilder {
  /// Require an authorized credential carrying `scope` to resolve any field
  /// of `T`.
  pub fn guard_type<T: Resolvable>(mut self, scope: Scope) -> Self {
    self.overlay.types.insert(T::TYPE_NAME, scope);
    self
  }

  /// Replace `T.field` with [`REDACTED`] for callers without `scope`.
  pub fn redact_field<T: Resolvable>(
    mut self,
    field: &'static str,
    scope: Scope,
  ) -> Self {
    self
      .overlay
      .fields
      .entry(T::TYPE_NAME)
      .or_default()
      .push((field, scope));
    self
  }

  pub fn build(self) -> ScopeOverlay { self.overlay }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::person::Person;

  struct Tokens;

  impl AccessPolicy for Tokens {
    fn is_authorized(&self, token: &str) -> bool {
      matches!(token, "reader" | "personal" | "admin")
    }

    fn has_scope(&self, token: &str, scope: Scope) -> bool {
      match token {
        "reader" => scope == Scope::Read,
        "personal" => matches!(scope, Scope::Read | Scope::Personal),
        "admin" => true,
        _ => false,
      }
    }
  }

  #[derive(Serialize)]
  struct Secret {
    value: u32,
  }

  impl Resolvable for Secret {
    const TYPE_NAME: &'static str = "Secret";
  }

  fn overlay() -> ScopeOverlay {
    ScopeOverlay::builder()
      .redact_field::<Person>("email", Scope::Personal)
      .guard_type::<Secret>(Scope::Admin)
      .build()
  }

  fn person() -> Person {
    Person {
      id:         "p1".into(),
      first_name: "Ada".into(),
      last_name:  "Lovelace".into(),
      dob:        None,
      email:      Some("ada@example.com".into()),
    }
  }

  #[test]
  fn email_visible_with_personal_scope() {
    let grants = Grants::resolve(&Tokens, Some("personal"));
    let out = overlay().resolve(&person(), &grants).unwrap();
    assert_eq!(out["email"], "ada@example.com");
  }

  #[test]
  fn email_redacted_without_personal_scope() {
    let o = overlay();
    for grants in [
      Grants::resolve(&Tokens, Some("reader")),
      Grants::resolve(&Tokens, Some("forged")),
      Grants::resolve(&Tokens, None),
    ] {
      let out = o.resolve(&person(), &grants).unwrap();
      assert_eq!(out["email"], REDACTED);
      assert_eq!(out["last_name"], "Lovelace");
    }
  }

  #[test]
  fn guarded_type_requires_authorized_scope() {
    let o = overlay();
    let admin = Grants::resolve(&Tokens, Some("admin"));
    assert_eq!(o.resolve(&Secret { value: 7 }, &admin).unwrap()["value"], 7);

    let reader = Grants::resolve(&Tokens, Some("reader"));
    match o.resolve(&Secret { value: 7 }, &reader) {
      Err(Error::AuthorizationDenied { type_name }) => assert_eq!(type_name, "Secret"),
      other => panic!("expected AuthorizationDenied, got {other:?}"),
    }
  }

  #[test]
  fn unregistered_types_pass_through() {
    let out = ScopeOverlay::default()
      .resolve(&person(), &Grants::anonymous())
      .unwrap();
    assert_eq!(out["email"], "ada@example.com");
  }

  #[test]
  fn bearer_header_forms() {
    assert_eq!(bearer_token("Bearer abc"), Some("abc"));
    assert_eq!(bearer_token("bearer  abc "), Some("abc"));
    assert_eq!(bearer_token("abc"), Some("abc"));
    assert_eq!(bearer_token("Basic dXNlcg=="), None);
    assert_eq!(bearer_token("Bearer "), None);
    assert_eq!(bearer_token(""), None);
  }
}
