// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Throwaway signing key for tests. Never installed on a real App.

pub const TEST_APP_PRIVATE_KEY: &str = include_str!("../tests/fixtures/test-app-key.pem");
pub const TEST_APP_PUBLIC_KEY: &str = include_str!("../tests/fixtures/test-app-key.pub.pem");
