pub mod canonical_resizer;
