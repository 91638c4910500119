//! Property-based tests for repository URL handling.

#[cfg(test)]
mod proptest_tests {
    use crate::git::{authenticated_url, repo_name};
    use proptest::prelude::*;

    proptest! {
        /// Property: the name is the last path segment without `.git`
        #[test]
        fn https_url_yields_last_segment(
            org in "[a-zA-Z0-9_-]{1,20}",
            name in "[a-zA-Z0-9_-]{1,30}",
        ) {
            let url = format!("https://github.com/{}/{}.git", org, name);
            prop_assert_eq!(repo_name(&url).unwrap(), name);
        }

        /// Property: `.git` and trailing slashes do not change the name
        #[test]
        fn suffixes_do_not_change_name(name in "[a-zA-Z0-9_-]{1,30}") {
            let plain = format!("https://example.com/team/{}", name);
            let with_git = format!("{}.git", plain);
            let with_slash = format!("{}/", plain);
            let expected = repo_name(&plain).unwrap();
            prop_assert_eq!(repo_name(&with_git).unwrap(), expected.clone());
            prop_assert_eq!(repo_name(&with_slash).unwrap(), expected);
        }

        /// Property: scp-like and https URLs of one repository agree
        #[test]
        fn scp_and_https_agree(
            org in "[a-z0-9]{1,12}",
            name in "[a-zA-Z0-9_-]{1,30}",
        ) {
            let https = format!("https://github.com/{}/{}.git", org, name);
            let scp = format!("git@github.com:{}/{}.git", org, name);
            prop_assert_eq!(repo_name(&https).unwrap(), repo_name(&scp).unwrap());
        }

        /// Property: the name never contains a path separator
        #[test]
        fn name_has_no_separator(input in "[a-z:/@.]{1,40}") {
            if let Ok(name) = repo_name(&input) {
                prop_assert!(!name.contains('/'));
                prop_assert!(!name.is_empty());
            }
        }

        /// Property: adding a token keeps the repository name
        #[test]
        fn token_does_not_change_name(
            name in "[a-zA-Z0-9_-]{1,30}",
            token in "[a-zA-Z0-9_]{1,40}",
        ) {
            let url = format!("https://github.com/acme/{}.git", name);
            let authed = authenticated_url(&url, Some(&token)).unwrap();
            prop_assert!(authed.contains(&token));
            prop_assert_eq!(repo_name(&authed).unwrap(), name);
        }
    }
}
