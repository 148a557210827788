//! Best-effort content sniffing
//!
//! Language and framework detection are non-authoritative hints derived
//! from marker substrings; a miss returns `None` rather than guessing.

/// Guess the programming language of code content
pub fn detect_language(content: &str) -> Option<&'static str> {
    if content.contains("def ") && content.contains("import ") {
        Some("python")
    } else if content.contains("function ") && content.contains("const ") {
        Some("javascript")
    } else if content.contains("public class") && content.contains("public static void main") {
        Some("java")
    } else if content.contains("package main") && content.contains("func main") {
        Some("go")
    } else if content.contains("fn main") && content.contains("let ") {
        Some("rust")
    } else {
        None
    }
}

/// Guess the framework used by code content
pub fn detect_framework(content: &str) -> Option<&'static str> {
    if content.contains("from fastapi import") {
        Some("fastapi")
    } else if content.contains("from flask import") {
        Some("flask")
    } else if content.contains("import express") {
        Some("express")
    } else if content.contains("from django") {
        Some("django")
    } else if content.contains("axum::") {
        Some("axum")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_language() {
        assert_eq!(
            detect_language("import os\n\ndef main():\n    pass\n"),
            Some("python")
        );
        assert_eq!(
            detect_language("const x = 1;\nfunction go() {}\n"),
            Some("javascript")
        );
        assert_eq!(
            detect_language("package main\n\nfunc main() {}\n"),
            Some("go")
        );
        assert_eq!(
            detect_language("fn main() {\n    let x = 1;\n}\n"),
            Some("rust")
        );
        assert_eq!(detect_language("SELECT 1;"), None);
    }

    #[test]
    fn test_detect_framework() {
        assert_eq!(
            detect_framework("from fastapi import FastAPI"),
            Some("fastapi")
        );
        assert_eq!(detect_framework("import express from 'express'"), Some("express"));
        assert_eq!(detect_framework("use axum::Router;"), Some("axum"));
        assert_eq!(detect_framework("plain text"), None);
    }
}
