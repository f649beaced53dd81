use std::sync::Arc;

use rsvp_core::models::LoginResponse;
use rsvp_core::routing::{Navigation, RouteGuard, RouteTable, Router, HOME_PATH, LOGIN_PATH};
use rsvp_core::session::{AuthSession, AuthState, Session, AUTH_STORE_ID};
use rsvp_core::store::{FileSnapshotRepository, MemorySnapshotRepository, SnapshotRepository};
use serde_json::json;
use speculate2::speculate;

fn login_response(token: &str, user: serde_json::Value) -> LoginResponse {
    serde_json::from_value(json!({ "token": token, "user": user }))
        .expect("Failed to build login response")
}

fn assert_invariant(session: &AuthSession) {
    let snapshot = session.snapshot();
    assert_eq!(session.is_authenticated(), !snapshot.token.is_empty());
}

speculate! {
    before {
        let repo = Arc::new(MemorySnapshotRepository::new());
        let session = AuthSession::open(repo.clone());
    }

    describe "auth session" {
        it "starts unauthenticated with no user" {
            assert_eq!(session.snapshot(), Session::default());
            assert_eq!(session.state(), AuthState::Unauthenticated);
        }

        describe "login" {
            it "sets token and user together" {
                session.login(login_response("abc", json!({ "id": 1 })));

                assert!(session.is_authenticated());
                assert_eq!(session.token(), "abc");
                assert_eq!(
                    serde_json::to_value(session.user().expect("user missing")).unwrap(),
                    json!({ "id": 1 })
                );
                assert_invariant(&session);
            }

            it "replaces a previous session" {
                session.login(login_response("first", json!({ "id": 1 })));
                session.login(login_response("second", json!({ "id": 2 })));

                assert_eq!(session.token(), "second");
                assert_eq!(session.user().unwrap().get("id"), Some(&json!(2)));
            }
        }

        describe "logout" {
            it "clears token and user" {
                session.login(login_response("abc", json!({ "id": 1 })));

                session.logout();

                assert_eq!(session.token(), "");
                assert!(session.user().is_none());
                assert!(!session.is_authenticated());
                assert_invariant(&session);
            }

            it "is harmless when already logged out" {
                session.logout();

                assert_eq!(session.snapshot(), Session::default());
                assert_eq!(repo.writes(AUTH_STORE_ID), 1);
            }
        }

        describe "clear_token" {
            it "empties the token but keeps the user" {
                session.login(login_response("abc", json!({ "id": 1, "name": "Ada" })));
                let before = session.user();

                session.clear_token();

                assert_eq!(session.token(), "");
                assert_eq!(session.user(), before);
                assert!(!session.is_authenticated());
                assert_invariant(&session);
            }
        }

        describe "set_token" {
            it "replaces only the token" {
                session.login(login_response("abc", json!({ "id": 1 })));

                session.set_token("def");

                assert_eq!(session.token(), "def");
                assert!(session.user().is_some());
                assert_invariant(&session);
            }

            it "authenticates without a user" {
                session.set_token("def");

                assert!(session.is_authenticated());
                assert!(session.user().is_none());
            }

            it "with an empty token is unauthenticated" {
                session.set_token("abc");
                session.set_token("");

                assert!(!session.is_authenticated());
                assert_invariant(&session);
            }
        }

        it "writes a snapshot on every mutation" {
            session.login(login_response("abc", json!({ "id": 1 })));
            session.set_token("def");
            session.clear_token();
            session.logout();

            assert_eq!(repo.writes(AUTH_STORE_ID), 4);
        }
    }

    describe "rehydration" {
        it "restores a saved token before any mutation" {
            let repo = Arc::new(MemorySnapshotRepository::new());
            repo.insert(AUTH_STORE_ID, r#"{"token":"xyz"}"#);

            let session = AuthSession::open(repo.clone());

            assert_eq!(session.token(), "xyz");
            assert!(session.user().is_none());
            assert!(session.is_authenticated());
            assert_eq!(repo.writes(AUTH_STORE_ID), 0);
        }

        it "restores a full session written by a previous process" {
            session.login(login_response("abc", json!({ "id": 1 })));

            let reopened = AuthSession::open(repo.clone());

            assert_eq!(reopened.snapshot(), session.snapshot());
        }

        it "falls back to an empty session on a corrupt snapshot" {
            let repo = Arc::new(MemorySnapshotRepository::new());
            repo.insert(AUTH_STORE_ID, "{\"token\": ");

            let session = AuthSession::open(repo);

            assert_eq!(session.snapshot(), Session::default());
        }

        it "falls back to an empty session when the user is not an object" {
            let repo = Arc::new(MemorySnapshotRepository::new());
            repo.insert(AUTH_STORE_ID, r#"{"token":"xyz","user":"ada"}"#);

            let session = AuthSession::open(repo);

            assert_eq!(session.snapshot(), Session::default());
        }

        it "survives a restart on disk" {
            let dir = tempfile::TempDir::new().expect("Failed to create temp dir");
            let repo: Arc<dyn SnapshotRepository> = Arc::new(FileSnapshotRepository::new(dir.path()));

            AuthSession::open(repo.clone()).login(login_response("abc", json!({ "id": 1 })));
            let session = AuthSession::open(repo);

            assert_eq!(session.token(), "abc");
        }
    }

    describe "route guard" {
        it "redirects home to login while unauthenticated" {
            let guard = RouteGuard::new(Arc::new(session), RouteTable::default());

            assert_eq!(
                guard.check(HOME_PATH),
                Navigation::Redirect { from: HOME_PATH.to_string(), to: LOGIN_PATH.to_string() }
            );
        }

        it "lets an authenticated user in" {
            session.set_token("abc");
            let guard = RouteGuard::new(Arc::new(session), RouteTable::default());

            assert_eq!(guard.check(HOME_PATH), Navigation::Proceed { path: HOME_PATH.to_string() });
        }

        it "always allows the login route" {
            let session = Arc::new(session);
            let guard = RouteGuard::new(session.clone(), RouteTable::default());
            assert!(!guard.check(LOGIN_PATH).is_redirect());

            session.set_token("abc");
            assert!(!guard.check(LOGIN_PATH).is_redirect());
        }

        it "follows the session as it changes" {
            let session = Arc::new(session);
            let router = Router::new(session.clone());

            router.push(HOME_PATH);
            session.set_token("abc");
            router.push(HOME_PATH);
            session.logout();
            router.push(HOME_PATH);

            assert_eq!(router.history(), vec![LOGIN_PATH, HOME_PATH, LOGIN_PATH]);
        }
    }
}
