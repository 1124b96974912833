mod tests_deviations;
mod tests_features;
mod tests_identities;
mod tests_linking;
mod tests_types;
mod tests_worklist;
