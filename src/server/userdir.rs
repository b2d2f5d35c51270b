//! Home directories behind `/~user/` paths.

use std::fmt::Debug;
use std::path::PathBuf;
use std::sync::Arc;

use log::debug;
use nix::unistd::User;

/// Looks up users' home directories.
///
/// Lookups may block, so they are always run off the async workers.
pub trait HomeDirectories: Debug + Send + Sync {
    /// The home directory of `user`, or `None` if there is no such user.
    fn home_dir(&self, user: &str) -> Option<PathBuf>;
}

/// Home directories from the system password database.
#[derive(Debug, Clone, Copy, Default)]
pub struct PasswdHomes;

impl HomeDirectories for PasswdHomes {
    fn home_dir(&self, user: &str) -> Option<PathBuf> {
        match User::from_name(user) {
            Ok(user) => user.map(|user| user.dir),
            Err(e) => {
                debug!("User lookup for {user:?} failed: {e}");
                None
            }
        }
    }
}

/// The directory `/~user/` serves: `suffix` below the user's home.
///
/// The suffix always stays below the home directory, even when it is
/// written as an absolute path.
pub async fn user_docroot(homes: &Arc<dyn HomeDirectories>, user: &str, suffix: &str) -> Option<PathBuf> {
    let homes = Arc::clone(homes);
    let user = user.to_string();
    let home = tokio::task::spawn_blocking(move || homes.home_dir(&user))
        .await
        .ok()??;
    Some(home.join(suffix.trim_start_matches('/')))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[derive(Debug)]
    struct Fixed(BTreeMap<String, PathBuf>);

    impl HomeDirectories for Fixed {
        fn home_dir(&self, user: &str) -> Option<PathBuf> {
            self.0.get(user).cloned()
        }
    }

    fn homes() -> Arc<dyn HomeDirectories> {
        let mut map = BTreeMap::new();
        map.insert("alice".to_string(), PathBuf::from("/home/alice"));
        Arc::new(Fixed(map))
    }

    #[tokio::test]
    async fn test_user_docroot_joins_suffix() {
        let dir = user_docroot(&homes(), "alice", "public_html").await;
        assert_eq!(dir, Some(PathBuf::from("/home/alice/public_html")));
    }

    #[tokio::test]
    async fn test_absolute_suffix_stays_below_home() {
        let dir = user_docroot(&homes(), "alice", "/etc").await;
        assert_eq!(dir, Some(PathBuf::from("/home/alice/etc")));
    }

    #[tokio::test]
    async fn test_unknown_user() {
        assert_eq!(user_docroot(&homes(), "bob", "public_html").await, None);
    }

    #[test]
    fn test_passwd_lookup_of_missing_user() {
        assert_eq!(PasswdHomes.home_dir("no-such-user-here"), None);
    }
}
