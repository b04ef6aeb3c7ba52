mod common;
mod test_unauthorized;
