//! Binary operator construction with precedence fix-up.
//!
//! The parser reads `left OP rest-of-group`, so operators arrive in
//! right-recursive shape. `make` rebalances the new node against operator
//! children of different priority: a looser operator on the left is lifted
//! above the new node, and an operator on the right that binds at least as
//! tightly as the current top is rotated above it.
//!
//! The parser hands every right-hand side over wrapped in a block, so on
//! parsed programs neither rotation fires and chains stay right-nested;
//! the rotations only shape trees built directly from operator nodes.

use crate::ast::types::{Evaluable, OperatorKind, OperatorNode};

fn node(kind: OperatorKind, pos: usize, left: Evaluable, right: Evaluable) -> Evaluable {
    Evaluable::Operator(OperatorNode {
        pos,
        kind,
        left: Box::new(left),
        right: Box::new(right),
    })
}

/// Combine `left kind right` into a subtree and return its root.
pub fn make(kind: OperatorKind, pos: usize, left: Evaluable, right: Evaluable) -> Evaluable {
    let mut central_priority = kind.priority();

    // left.right moves under the new node, left becomes the root.
    let (left, lifted) = match left {
        Evaluable::Operator(op) if op.kind.priority() < central_priority => {
            central_priority = op.kind.priority();
            let OperatorNode { pos: lpos, kind: lkind, left: lleft, right: lright } = op;
            (*lright, Some((lkind, lpos, *lleft)))
        }
        other => (other, None),
    };

    // right.left moves under the new node, right becomes the root.
    let (right, rotated) = match right {
        Evaluable::Operator(op) if op.kind.priority() >= central_priority => {
            let OperatorNode { pos: rpos, kind: rkind, left: rleft, right: rright } = op;
            (*rleft, Some((rkind, rpos, *rright)))
        }
        other => (other, None),
    };

    let central = node(kind, pos, left, right);
    let root = match lifted {
        Some((lkind, lpos, lleft)) => node(lkind, lpos, lleft, central),
        None => central,
    };
    match rotated {
        Some((rkind, rpos, rright)) => node(rkind, rpos, root, rright),
        None => root,
    }
}
