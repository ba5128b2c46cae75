/// Instruction sent to the backend. `{request}` is replaced with the user's line.
///
/// The formats listed here are the ones the extractor understands, so a model
/// that follows them produces text the classifier can act on.
pub const PROMPT_TEMPLATE: &str = "You are a database assistant. Based on the following request, generate a database operation.
Available operations: create user, get user, update user, delete user, list all users.
Request: {request}
Respond with the exact operation to perform, including all relevant parameters.
For create operations, use format: create user named John Doe email john@example.com age 30
For get operations, use format: get user with id=1 or get user with email=john@example.com
For update operations, use format: update user id 1 named Jane Doe email jane@example.com
For delete operations, use format: delete user with id=1
For list operations, use format: list all users";

pub fn build_prompt(request: &str) -> String {
    PROMPT_TEMPLATE.replace("{request}", request.trim())
}
