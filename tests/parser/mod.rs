mod tests_paths;
