//! JSON debug dump of a parsed tree.
//!
//! Every node serialises as an object tagged with `"type"` and carrying its
//! byte `pos`. Word separators inside command expressions appear as `null`.

use serde_json::Value;

use crate::ast::types::Evaluable;

pub fn to_json(root: &Evaluable) -> Result<Value, serde_json::Error> {
    serde_json::to_value(root)
}

pub fn to_json_string(root: &Evaluable) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::types::{Ast, CommandExprNode};

    #[test]
    fn test_command_dump() {
        let expr = CommandExprNode {
            pos: 0,
            parts: vec![Some(Ast::word(0, "echo")), None, Some(Ast::word(5, "hi"))],
        };
        let json = to_json(&Ast::command(0, expr)).unwrap();
        assert_eq!(json["type"], "Command");
        assert_eq!(json["pos"], 0);
        let parts = json["expr"]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0]["type"], "Word");
        assert_eq!(parts[0]["text"], "echo");
        assert!(parts[1].is_null());
        assert_eq!(parts[2]["pos"], 5);
    }

    #[test]
    fn test_null_dump() {
        let text = to_json_string(&Ast::null(0)).unwrap();
        assert!(text.contains("\"type\": \"Null\""));
    }
}
