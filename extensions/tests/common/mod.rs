use std::env;

use gitdocs_core::RepoConfig;

// Helper function to read a variable or skip the test
pub fn get_var_or_skip(var_name: &str, test_name: &str) -> Option<String> {
    dotenv::dotenv().ok(); // Load .env file if present

    match env::var(var_name) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => {
            println!("Skipping integration test {} - {} environment variable not set.", test_name, var_name);
            None // Signal to skip
        }
    }
}

// Repository settings for live tests. Documents go under a scratch directory
// so they never mix with real content.
pub fn get_test_config(test_name: &str) -> Option<RepoConfig> {
    let token = get_var_or_skip("GITHUB_TOKEN", test_name)?;
    let owner = get_var_or_skip("GITDOCS_TEST_OWNER", test_name)?;
    let repo = get_var_or_skip("GITDOCS_TEST_REPO", test_name)?;

    let config = RepoConfig::new(owner, repo, token)
        .expect("Invalid test repository settings")
        .base_path(format!("gitdocs-test/{}", test_name));
    Some(config)
}
